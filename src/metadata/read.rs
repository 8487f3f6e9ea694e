//! Compact module image decoding.
//!
//! Turns a raw byte buffer into a [`crate::metadata::module::Module`] graph. The
//! decoder is strict: every structural deviation is a typed format error rather
//! than a best-effort partial graph, because the toolchain mutates and re-serializes
//! whatever it loads.

use crate::{
    file::Parser,
    metadata::{
        attributes::{
            CustomAttribute, CustomAttributeArgument, ELEMENT_TYPE_BOOLEAN, ELEMENT_TYPE_I4,
            ELEMENT_TYPE_I8, ELEMENT_TYPE_R8, ELEMENT_TYPE_STRING,
        },
        field::Field,
        il::{Instruction, MethodBody, MethodRef, OpCode, Operand, OperandKind},
        method::Method,
        module::Module,
        property::Property,
        typedef::CilType,
    },
    Result,
};

/// Image magic, `CMOD` in little-endian byte order.
pub const CMOD_MAGIC: u32 = 0x444F_4D43;
/// The single format version this toolchain reads and writes.
pub const CMOD_VERSION: u16 = 1;

/// Maximum permitted type nesting depth; deeper images are rejected as malformed.
const MAX_NESTING: usize = 64;

/// Parse a module image.
pub(crate) fn read_module(data: &[u8]) -> Result<Module> {
    if data.is_empty() {
        return Err(crate::Error::Empty);
    }

    let mut parser = Parser::new(data);

    let magic = parser.read_le::<u32>()?;
    if magic != CMOD_MAGIC {
        return Err(crate::Error::NotSupported);
    }

    let version = parser.read_le::<u16>()?;
    if version != CMOD_VERSION {
        return Err(crate::Error::NotSupported);
    }

    let reserved = parser.read_le::<u16>()?;
    if reserved != 0 {
        return Err(malformed_error!(
            "Reserved header field must be zero, found {:#06x}",
            reserved
        ));
    }

    let name = parser.read_prefixed_string_utf8()?;

    let mut mvid = [0u8; 16];
    mvid.copy_from_slice(parser.read_bytes(16)?);

    let type_count = parser.read_compressed_uint()? as usize;
    let mut types = Vec::with_capacity(type_count.min(1024));
    for _ in 0..type_count {
        types.push(read_type(&mut parser, 0)?);
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after the last type",
            parser.remaining()
        ));
    }

    Ok(Module {
        name,
        mvid: uguid::Guid::from_bytes(mvid),
        types,
    })
}

fn read_type(parser: &mut Parser<'_>, depth: usize) -> Result<CilType> {
    if depth > MAX_NESTING {
        return Err(malformed_error!(
            "Type nesting exceeds the supported depth of {}",
            MAX_NESTING
        ));
    }

    let flags = parser.read_le::<u32>()?;
    let namespace = parser.read_prefixed_string_utf8()?;
    let name = parser.read_prefixed_string_utf8()?;

    let field_count = parser.read_compressed_uint()? as usize;
    let mut fields = Vec::with_capacity(field_count.min(1024));
    for _ in 0..field_count {
        fields.push(read_field(parser)?);
    }

    let method_count = parser.read_compressed_uint()? as usize;
    let mut methods = Vec::with_capacity(method_count.min(1024));
    for _ in 0..method_count {
        methods.push(read_method(parser)?);
    }

    let property_count = parser.read_compressed_uint()? as usize;
    let mut properties = Vec::with_capacity(property_count.min(1024));
    for _ in 0..property_count {
        properties.push(read_property(parser)?);
    }

    let nested_count = parser.read_compressed_uint()? as usize;
    let mut nested_types = Vec::with_capacity(nested_count.min(1024));
    for _ in 0..nested_count {
        nested_types.push(read_type(parser, depth + 1)?);
    }

    let custom_attributes = read_attributes(parser)?;

    Ok(CilType {
        flags,
        namespace,
        name,
        fields,
        methods,
        properties,
        nested_types,
        custom_attributes,
    })
}

fn read_field(parser: &mut Parser<'_>) -> Result<Field> {
    let flags = parser.read_le::<u32>()?;
    let name = parser.read_prefixed_string_utf8()?;
    let custom_attributes = read_attributes(parser)?;

    Ok(Field {
        flags,
        name,
        custom_attributes,
    })
}

fn read_method(parser: &mut Parser<'_>) -> Result<Method> {
    let flags = parser.read_le::<u32>()?;
    let name = parser.read_prefixed_string_utf8()?;

    let body = match parser.read_le::<u8>()? {
        0 => None,
        1 => {
            let instruction_count = parser.read_compressed_uint()? as usize;
            let mut instructions = Vec::with_capacity(instruction_count.min(4096));
            for _ in 0..instruction_count {
                instructions.push(read_instruction(parser)?);
            }
            Some(MethodBody::new(instructions))
        }
        other => {
            return Err(malformed_error!(
                "Invalid body presence flag {:#04x} on method '{}'",
                other,
                name
            ))
        }
    };

    let custom_attributes = read_attributes(parser)?;

    Ok(Method {
        flags,
        name,
        body,
        custom_attributes,
    })
}

fn read_property(parser: &mut Parser<'_>) -> Result<Property> {
    let name = parser.read_prefixed_string_utf8()?;
    let getter = read_optional_string(parser)?;
    let setter = read_optional_string(parser)?;
    let custom_attributes = read_attributes(parser)?;

    Ok(Property {
        name,
        getter,
        setter,
        custom_attributes,
    })
}

fn read_optional_string(parser: &mut Parser<'_>) -> Result<Option<String>> {
    match parser.read_le::<u8>()? {
        0 => Ok(None),
        1 => Ok(Some(parser.read_prefixed_string_utf8()?)),
        other => Err(malformed_error!(
            "Invalid presence flag {:#04x} for optional string",
            other
        )),
    }
}

fn read_instruction(parser: &mut Parser<'_>) -> Result<Instruction> {
    let opcode = OpCode::from_byte(parser.read_le::<u8>()?)?;

    let operand = match opcode.operand_kind() {
        OperandKind::None => Operand::None,
        OperandKind::Int32 => Operand::Int32(parser.read_le::<i32>()?),
        OperandKind::String => Operand::String(parser.read_prefixed_string_utf8()?),
        OperandKind::Method => {
            let declaring_type = parser.read_prefixed_string_utf8()?;
            let name = parser.read_prefixed_string_utf8()?;
            Operand::Method(MethodRef {
                declaring_type,
                name,
            })
        }
    };

    Ok(Instruction { opcode, operand })
}

fn read_attributes(parser: &mut Parser<'_>) -> Result<Vec<CustomAttribute>> {
    let count = parser.read_compressed_uint()? as usize;
    let mut attributes = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let ctor_type = parser.read_prefixed_string_utf8()?;

        let arg_count = parser.read_compressed_uint()? as usize;
        let mut fixed_args = Vec::with_capacity(arg_count.min(1024));
        for _ in 0..arg_count {
            fixed_args.push(read_argument(parser)?);
        }

        attributes.push(CustomAttribute {
            ctor_type,
            fixed_args,
        });
    }

    Ok(attributes)
}

fn read_argument(parser: &mut Parser<'_>) -> Result<CustomAttributeArgument> {
    let tag = parser.read_le::<u8>()?;
    match tag {
        ELEMENT_TYPE_BOOLEAN => match parser.read_le::<u8>()? {
            0 => Ok(CustomAttributeArgument::Bool(false)),
            1 => Ok(CustomAttributeArgument::Bool(true)),
            other => Err(malformed_error!("Invalid boolean payload {:#04x}", other)),
        },
        ELEMENT_TYPE_I4 => Ok(CustomAttributeArgument::I4(parser.read_le::<i32>()?)),
        ELEMENT_TYPE_I8 => Ok(CustomAttributeArgument::I8(parser.read_le::<i64>()?)),
        ELEMENT_TYPE_R8 => Ok(CustomAttributeArgument::R8(parser.read_le::<f64>()?)),
        ELEMENT_TYPE_STRING => Ok(CustomAttributeArgument::String(
            parser.read_prefixed_string_utf8()?,
        )),
        _ => Err(malformed_error!(
            "Unknown attribute argument element type {:#04x}",
            tag
        )),
    }
}
