//! Integration tests for the member visibility normalizer.

use cilpatch::prelude::*;

fn locked_down_module() -> Module {
    let mut service = CilType::new("Game", "SaveService", TypeVisibility::NOT_PUBLIC);
    service
        .fields
        .push(Field::new("_slots", MemberAccessFlags::PRIVATE));
    service
        .fields
        .push(Field::new("k__BackingField", MemberAccessFlags::COMPILER_CONTROLLED));
    service
        .methods
        .push(Method::new("Persist", MemberAccessFlags::FAM_AND_ASSEM));
    service
        .methods
        .push(Method::new("get_Slots", MemberAccessFlags::PRIVATE));
    service
        .methods
        .push(Method::new("set_Slots", MemberAccessFlags::PRIVATE));
    service
        .properties
        .push(Property::new("Slots", Some("get_Slots"), Some("set_Slots")));

    let mut nested = CilType::new("", "Writer", TypeVisibility::NESTED_FAMILY);
    nested
        .methods
        .push(Method::new("Flush", MemberAccessFlags::PRIVATE));
    service.nested_types.push(nested);

    let mut already_public = CilType::new("Game", "Api", TypeVisibility::PUBLIC);
    already_public
        .methods
        .push(Method::new("Query", MemberAccessFlags::PUBLIC));

    let mut module = Module::new("Game");
    module.add_type(service);
    module.add_type(already_public);
    module
}

#[test]
fn everything_non_public_is_widened() -> Result<()> {
    let mut module = locked_down_module();
    let summary = publicize(&mut module);

    // SaveService + nested Writer; Api was already public
    assert_eq!(summary.classes, 2);
    // _slots only; the backing field is compiler-controlled
    assert_eq!(summary.fields, 1);
    // Persist, both accessors, and Writer::Flush
    assert_eq!(summary.methods, 4);
    // Accessors were widened by the method pass, so no property change remained
    assert_eq!(summary.properties, 0);

    let mut non_public = Vec::new();
    module.visit_types(|ty| {
        if !ty.is_public() {
            non_public.push(ty.full_name());
        }
        for method in &ty.methods {
            if !method.is_compiler_controlled() {
                assert!(method.is_public(), "{} stayed non-public", method.name);
            }
        }
        for field in &ty.fields {
            if !field.is_compiler_controlled() {
                assert!(field.is_public(), "{} stayed non-public", field.name);
            }
        }
    });
    assert!(non_public.is_empty(), "still non-public: {non_public:?}");

    let nested = module.find_type("Game.SaveService/Writer").unwrap();
    assert_eq!(nested.visibility(), TypeVisibility::NESTED_PUBLIC);
    Ok(())
}

#[test]
fn second_pass_reports_zero_changes() {
    let mut module = locked_down_module();

    let first = publicize(&mut module);
    assert!(!first.is_empty());

    let second = publicize(&mut module);
    assert_eq!(second.total(), 0);
    assert_eq!(second, PublicizeSummary::default());
}

#[test]
fn publicized_module_roundtrips() -> Result<()> {
    let mut module = locked_down_module();
    publicize(&mut module);

    let reloaded = Module::from_bytes(&module.to_bytes()?)?;
    assert_eq!(reloaded, module);

    // And the reloaded copy has nothing left to widen either
    let mut reloaded = reloaded;
    assert!(publicize(&mut reloaded).is_empty());
    Ok(())
}
