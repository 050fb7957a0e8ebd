//! TypeScript source generator
//!
//! Renders a namespace as one `<namespace>.ts` file of config functions.

use crate::error::{CliError, CliResult};
use crate::generator::Generator;
use controlpath_native::codegen::source::{FunctionModel, MemberModel};
use controlpath_native::{codegen, CompilerError, Namespace};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "namespace.ts.tera";

/// TypeScript source generator
pub struct TypeScriptGenerator {
    tera: Tera,
}

#[derive(Debug, Serialize)]
struct InterfaceView {
    name: String,
    members: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BranchView {
    condition: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct FunctionView {
    doc_block: String,
    name: String,
    params: String,
    return_type: String,
    branches: Vec<BranchView>,
    default: String,
}

impl TypeScriptGenerator {
    pub fn new() -> CliResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, include_str!("templates/namespace.ts.tera"))
            .map_err(|e| CliError::Message(format!("Failed to load source template: {e}")))?;

        // Auto-escape is disabled for TypeScript code generation
        tera.autoescape_on(vec![]);

        Ok(Self { tera })
    }

    fn member_declaration(member: &MemberModel) -> String {
        let optional = if member.optional { "?" } else { "" };
        format!("{}{optional}: {}", member.name, member.ty)
    }

    fn doc_block(doc: &[String]) -> String {
        match doc {
            [] => String::new(),
            [line] => format!("/** {line} */\n"),
            lines => {
                let body: String = lines.iter().map(|line| format!(" * {line}\n")).collect();
                format!("/**\n{body} */\n")
            }
        }
    }

    fn function_view(function: &FunctionModel) -> FunctionView {
        FunctionView {
            doc_block: Self::doc_block(&function.doc),
            name: function.name.clone(),
            params: function.signature_params(),
            return_type: function.return_type.clone(),
            branches: function
                .branches
                .iter()
                .map(|branch| BranchView {
                    condition: branch.condition.clone(),
                    value: branch.value.clone(),
                })
                .collect(),
            default: function.default.clone(),
        }
    }

    /// Render the source text for `namespace`.
    pub fn render(&self, namespace: &Namespace) -> CliResult<String> {
        let model = codegen::source_model(namespace).map_err(CompilerError::from)?;

        let interfaces: Vec<InterfaceView> = model
            .interfaces
            .iter()
            .map(|interface| InterfaceView {
                name: interface.name.clone(),
                members: interface.members.iter().map(Self::member_declaration).collect(),
            })
            .collect();
        let functions: Vec<FunctionView> = model.functions.iter().map(Self::function_view).collect();

        let mut context = Context::new();
        context.insert("namespace", &model.namespace);
        context.insert("interfaces", &interfaces);
        context.insert("functions", &functions);

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| CliError::Message(format!("Failed to render {}.ts: {e}", namespace.name)))
    }
}

impl Generator for TypeScriptGenerator {
    fn generate(&self, namespace: &Namespace, output_dir: &Path) -> CliResult<PathBuf> {
        let source = self.render(namespace)?;

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}.ts", namespace.name));
        fs::write(&path, source)?;

        tracing::debug!(namespace = %namespace.name, path = %path.display(), "generated source");
        Ok(path)
    }
}
