//! Schema compiler - turns interface declarations into message descriptors

use std::collections::BTreeSet;

use crate::compiler::naming::{nested_message_name, snake_case};
use crate::compiler::source_location;
use crate::error::{CompilationError, CompilationErrorKind, CompilerError};
use crate::parser::{InterfaceDecl, Member, MemberKind, TypeKind, TypeNode};
use crate::schemas::{FieldDescriptor, FieldType, MessageDescriptor, ScalarType, SchemaRegistry};

/// Compiles the interfaces of one namespace into its registry.
pub struct SchemaCompiler<'a> {
    file: &'a str,
    namespace: &'a str,
    /// Short names of every interface in the file, so members may refer to
    /// interfaces declared later.
    known: BTreeSet<String>,
}

/// Compiled shape of one member type.
struct FieldShape {
    field_type: FieldType,
    repeated: bool,
    optional: bool,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new<'i>(
        file: &'a str,
        namespace: &'a str,
        interfaces: impl IntoIterator<Item = &'i InterfaceDecl>,
    ) -> Self {
        Self {
            file,
            namespace,
            known: interfaces
                .into_iter()
                .map(|interface| interface.name.name.clone())
                .collect(),
        }
    }

    /// Fully-qualified name of a short interface name.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        format!("{}.{name}", self.namespace)
    }

    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Compile one interface (and its hoisted anonymous members) into `registry`.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for unsupported member shapes and a schema
    /// error when a message name is already bound to a different shape.
    pub fn compile_interface(
        &self,
        interface: &InterfaceDecl,
        registry: &mut SchemaRegistry,
    ) -> Result<(), CompilerError> {
        let mut messages = Vec::new();
        self.compile_message(&interface.name.name, &interface.members, 0, &mut messages)
            .map_err(|err| err.in_declaration(&interface.name.name))?;
        for message in messages {
            registry.register(message)?;
        }
        Ok(())
    }

    fn compile_message(
        &self,
        name: &str,
        members: &[Member],
        depth: usize,
        out: &mut Vec<MessageDescriptor>,
    ) -> Result<(), CompilationError> {
        let mut fields = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let MemberKind::Property {
                name: member_name,
                optional,
                ty,
            } = &member.kind
            else {
                return Err(self.error(
                    member,
                    CompilationErrorKind::UnsupportedMember(member.kind.describe().to_string()),
                ));
            };

            let shape = self.field_shape(name, member_name, ty, depth, out)?;
            fields.push(FieldDescriptor {
                name: snake_case(member_name),
                number: u32::try_from(index + 1).unwrap_or(u32::MAX),
                field_type: shape.field_type,
                repeated: shape.repeated,
                optional: *optional || shape.optional,
            });
        }
        out.push(MessageDescriptor {
            name: self.qualify(name),
            fields,
        });
        Ok(())
    }

    fn field_shape(
        &self,
        parent: &str,
        field: &str,
        ty: &TypeNode,
        depth: usize,
        out: &mut Vec<MessageDescriptor>,
    ) -> Result<FieldShape, CompilationError> {
        if let TypeKind::Union(members) = &ty.kind {
            let inner = optional_member(members).ok_or_else(|| {
                self.type_error(ty, CompilationErrorKind::UnionNotSupported(ty.kind.describe()))
            })?;
            let mut shape = match inner {
                OptionalMember::Bool => FieldShape {
                    field_type: FieldType::Scalar(ScalarType::Bool),
                    repeated: false,
                    optional: false,
                },
                OptionalMember::Type(inner) => self.field_shape(parent, field, inner, depth, out)?,
            };
            shape.optional = true;
            return Ok(shape);
        }

        if let Some(element) = array_element(ty) {
            if array_element(element).is_some() {
                return Err(self.type_error(ty, CompilationErrorKind::ArrayOfArrayNotSupported));
            }
            if matches!(element.kind, TypeKind::Union(_)) {
                return Err(self.type_error(
                    element,
                    CompilationErrorKind::UnionNotSupported(element.kind.describe()),
                ));
            }
            let field_type = self.element_type(parent, field, element, depth, out)?;
            return Ok(FieldShape {
                field_type,
                repeated: true,
                optional: false,
            });
        }

        Ok(FieldShape {
            field_type: self.element_type(parent, field, ty, depth, out)?,
            repeated: false,
            optional: false,
        })
    }

    fn element_type(
        &self,
        parent: &str,
        field: &str,
        ty: &TypeNode,
        depth: usize,
        out: &mut Vec<MessageDescriptor>,
    ) -> Result<FieldType, CompilationError> {
        match &ty.kind {
            TypeKind::String => Ok(FieldType::Scalar(ScalarType::String)),
            TypeKind::Number => Ok(FieldType::Scalar(ScalarType::Double)),
            TypeKind::Boolean => Ok(FieldType::Scalar(ScalarType::Bool)),
            TypeKind::Reference { name, args } if args.is_empty() && self.is_known(name) => {
                Ok(FieldType::Message(self.qualify(name)))
            }
            TypeKind::Reference { name, .. } if !self.is_known(name) => Err(self.type_error(
                ty,
                CompilationErrorKind::UnresolvedType(ty.kind.describe()),
            )),
            TypeKind::Object(members) => {
                if depth > 0 {
                    return Err(
                        self.type_error(ty, CompilationErrorKind::NestingTooDeep(field.to_string()))
                    );
                }
                let nested = nested_message_name(parent, field);
                self.compile_message(&nested, members, depth + 1, out)?;
                Ok(FieldType::Message(self.qualify(&nested)))
            }
            other => Err(self.type_error(
                ty,
                CompilationErrorKind::UnsupportedType(other.describe()),
            )),
        }
    }

    fn error(&self, member: &Member, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::new(source_location(self.file, member.span), kind)
    }

    fn type_error(&self, ty: &TypeNode, kind: CompilationErrorKind) -> CompilationError {
        CompilationError::new(source_location(self.file, ty.span), kind)
    }
}

enum OptionalMember<'t> {
    Bool,
    Type(&'t TypeNode),
}

/// Recognise the optional-value union shapes: `T | undefined` and
/// `true | false | undefined`, in any member order.
fn optional_member(members: &[TypeNode]) -> Option<OptionalMember<'_>> {
    let (undefined, rest): (Vec<&TypeNode>, Vec<&TypeNode>) = members
        .iter()
        .partition(|member| matches!(member.kind, TypeKind::Undefined));
    if undefined.len() != 1 {
        return None;
    }
    match rest.as_slice() {
        [single] => Some(OptionalMember::Type(single)),
        [a, b] => match (&a.kind, &b.kind) {
            (TypeKind::BoolLiteral(x), TypeKind::BoolLiteral(y)) if x != y => {
                Some(OptionalMember::Bool)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Element type of `T[]` or `Array<T>`.
pub(crate) fn array_element(ty: &TypeNode) -> Option<&TypeNode> {
    match &ty.kind {
        TypeKind::Array(inner) => Some(inner),
        TypeKind::Reference { name, args } if name == "Array" && args.len() == 1 => args.first(),
        _ => None,
    }
}
