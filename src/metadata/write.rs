//! Compact module image encoding.
//!
//! The inverse of [`crate::metadata::read`]: serializes a module graph into the
//! container layout. Encoding validates the wire constraints the in-memory model
//! cannot express on its own (operand shapes, encodable counts) and fails without
//! producing partial output.

use crate::{
    file::io::{write_compressed_uint, write_le, write_prefixed_string},
    metadata::{
        attributes::{CustomAttribute, CustomAttributeArgument},
        field::Field,
        il::{Instruction, Operand},
        method::Method,
        module::Module,
        property::Property,
        read::{CMOD_MAGIC, CMOD_VERSION},
        typedef::CilType,
    },
    Result,
};

/// Serialize a module graph into `out`.
pub(crate) fn write_module(module: &Module, out: &mut Vec<u8>) -> Result<()> {
    write_le(out, CMOD_MAGIC);
    write_le(out, CMOD_VERSION);
    write_le(out, 0u16);

    write_prefixed_string(out, &module.name)?;
    out.extend_from_slice(&module.mvid.to_bytes());

    write_count(out, module.types.len())?;
    for ty in &module.types {
        write_type(out, ty)?;
    }

    Ok(())
}

fn write_count(out: &mut Vec<u8>, count: usize) -> Result<()> {
    let Ok(count) = u32::try_from(count) else {
        return Err(crate::Error::OutOfBounds);
    };

    write_compressed_uint(out, count)
}

fn write_type(out: &mut Vec<u8>, ty: &CilType) -> Result<()> {
    write_le(out, ty.flags);
    write_prefixed_string(out, &ty.namespace)?;
    write_prefixed_string(out, &ty.name)?;

    write_count(out, ty.fields.len())?;
    for field in &ty.fields {
        write_field(out, field)?;
    }

    write_count(out, ty.methods.len())?;
    for method in &ty.methods {
        write_method(out, method)?;
    }

    write_count(out, ty.properties.len())?;
    for property in &ty.properties {
        write_property(out, property)?;
    }

    write_count(out, ty.nested_types.len())?;
    for nested in &ty.nested_types {
        write_type(out, nested)?;
    }

    write_attributes(out, &ty.custom_attributes)
}

fn write_field(out: &mut Vec<u8>, field: &Field) -> Result<()> {
    write_le(out, field.flags);
    write_prefixed_string(out, &field.name)?;
    write_attributes(out, &field.custom_attributes)
}

fn write_method(out: &mut Vec<u8>, method: &Method) -> Result<()> {
    write_le(out, method.flags);
    write_prefixed_string(out, &method.name)?;

    match &method.body {
        None => write_le(out, 0u8),
        Some(body) => {
            write_le(out, 1u8);
            write_count(out, body.instructions.len())?;
            for instruction in &body.instructions {
                write_instruction(out, instruction)?;
            }
        }
    }

    write_attributes(out, &method.custom_attributes)
}

fn write_property(out: &mut Vec<u8>, property: &Property) -> Result<()> {
    write_prefixed_string(out, &property.name)?;
    write_optional_string(out, property.getter.as_deref())?;
    write_optional_string(out, property.setter.as_deref())?;
    write_attributes(out, &property.custom_attributes)
}

fn write_optional_string(out: &mut Vec<u8>, value: Option<&str>) -> Result<()> {
    match value {
        None => write_le(out, 0u8),
        Some(value) => {
            write_le(out, 1u8);
            write_prefixed_string(out, value)?;
        }
    }

    Ok(())
}

fn write_instruction(out: &mut Vec<u8>, instruction: &Instruction) -> Result<()> {
    if instruction.opcode.operand_kind() != instruction.operand.kind() {
        return Err(malformed_error!(
            "Opcode '{}' paired with a {:?} operand",
            instruction.opcode,
            instruction.operand.kind()
        ));
    }

    write_le(out, instruction.opcode.byte());

    match &instruction.operand {
        Operand::None => {}
        Operand::Int32(value) => write_le(out, *value),
        Operand::String(value) => write_prefixed_string(out, value)?,
        Operand::Method(target) => {
            write_prefixed_string(out, &target.declaring_type)?;
            write_prefixed_string(out, &target.name)?;
        }
    }

    Ok(())
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[CustomAttribute]) -> Result<()> {
    write_count(out, attributes.len())?;

    for attribute in attributes {
        write_prefixed_string(out, &attribute.ctor_type)?;
        write_count(out, attribute.fixed_args.len())?;
        for argument in &attribute.fixed_args {
            write_argument(out, argument)?;
        }
    }

    Ok(())
}

fn write_argument(out: &mut Vec<u8>, argument: &CustomAttributeArgument) -> Result<()> {
    write_le(out, argument.element_type());

    match argument {
        CustomAttributeArgument::Bool(value) => write_le(out, u8::from(*value)),
        CustomAttributeArgument::I4(value) => write_le(out, *value),
        CustomAttributeArgument::I8(value) => write_le(out, *value),
        CustomAttributeArgument::R8(value) => write_le(out, *value),
        CustomAttributeArgument::String(value) => write_prefixed_string(out, value)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        flags::{MemberAccessFlags, TypeVisibility},
        il::{MethodBody, OpCode},
    };

    #[test]
    fn roundtrip_preserves_graph() {
        let mut ty = CilType::new("Game", "StartupScreenController", TypeVisibility::NOT_PUBLIC);
        ty.fields
            .push(Field::new("_handle", MemberAccessFlags::PRIVATE));
        ty.methods.push(
            Method::new("Awake", MemberAccessFlags::PRIVATE).with_body(MethodBody::new(vec![
                Instruction::ldstr("booting"),
                Instruction::ldc_i4(-1),
                Instruction::ret(),
            ])),
        );
        ty.properties
            .push(Property::new("Handle", Some("get_Handle"), None));
        ty.custom_attributes.push(CustomAttribute::with_args(
            "PatchedAttribute",
            vec![
                CustomAttributeArgument::String("0.2.1".into()),
                CustomAttributeArgument::I4(0),
                CustomAttributeArgument::I4(1),
            ],
        ));

        let mut module = Module::new("Sample");
        module.add_type(ty);

        let bytes = module.to_bytes().unwrap();
        let reloaded = Module::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded, module);
    }

    #[test]
    fn mismatched_operand_is_rejected() {
        let broken = Instruction {
            opcode: OpCode::Call,
            operand: Operand::Int32(9),
        };

        let mut out = Vec::new();
        assert!(matches!(
            write_instruction(&mut out, &broken),
            Err(crate::Error::Malformed { .. })
        ));
    }
}
