//! Integration tests for the injection engine state machine.
//!
//! Covers the patch/unpatch inverse law, the precondition failures, descriptor
//! accuracy, target discovery, and forcepatch convergence.

use cilpatch::{
    bootstrap,
    patcher::{PatchMode, PatchOutcome, Patcher},
    prelude::*,
};

/// An unpatched module carrying the well-known target plus unrelated content.
fn target_module() -> Module {
    let mut controller = CilType::new("Game.Ui", "StartupScreenController", TypeVisibility::PUBLIC);
    controller.methods.push(
        Method::new("Awake", MemberAccessFlags::PRIVATE).with_body(MethodBody::new(vec![
            Instruction::ldstr("splash"),
            Instruction::call(MethodRef::new("Game.Engine", "ShowSplash")),
            Instruction::ret(),
        ])),
    );
    controller
        .methods
        .push(Method::new("Update", MemberAccessFlags::PRIVATE).with_body(MethodBody::default()));

    let mut bystander = CilType::new("Game", "Bystander", TypeVisibility::NOT_PUBLIC);
    bystander
        .fields
        .push(Field::new("_data", MemberAccessFlags::PRIVATE));

    let mut module = Module::new("Game");
    module.add_type(controller);
    module.add_type(bystander);
    module
}

/// The target method's instruction stream after the engine ran.
fn awake_instructions(module: &Module) -> Vec<Instruction> {
    module
        .find_type("Game.Ui.StartupScreenController")
        .unwrap()
        .find_method("Awake")
        .unwrap()
        .body
        .as_ref()
        .unwrap()
        .instructions
        .clone()
}

#[test]
fn patch_injects_call_payload_and_markers() -> Result<()> {
    let mut module = target_module();

    let outcome = Patcher::new(&mut module).run(PatchMode::Patch)?;
    let PatchOutcome::Patched(descriptor) = outcome else {
        panic!("expected Patched outcome");
    };

    assert_eq!(descriptor.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(descriptor.start_index, 0);
    assert_eq!(descriptor.end_index, 1);

    // The injected call sits before the original first instruction
    let instructions = awake_instructions(&module);
    assert_eq!(instructions.len(), 4);
    assert!(instructions[0].is_call_to(&MethodRef::new(
        "Game.Ui.StartupScreenController",
        bootstrap::BOOTSTRAP_METHOD_NAME
    )));
    assert_eq!(instructions[1], Instruction::ldstr("splash"));

    // The payload landed right behind the target method, tagged injected
    let registry = MarkerRegistry::new();
    let controller = module.find_type("Game.Ui.StartupScreenController").unwrap();
    assert_eq!(controller.methods[1].name, bootstrap::BOOTSTRAP_METHOD_NAME);
    assert!(registry.is_marked(&controller.methods[1], MarkerKind::Injected));

    // Both marker attribute types were injected and tagged, the injected marker
    // type with itself
    for kind in [MarkerKind::Injected, MarkerKind::Patched] {
        let marker_type = module.find_type(registry.full_name(kind)).unwrap();
        assert!(registry.is_marked(marker_type, MarkerKind::Injected));
    }

    Ok(())
}

#[test]
fn unpatch_is_the_exact_inverse_of_patch() -> Result<()> {
    let original = target_module();

    let mut module = original.clone();
    Patcher::new(&mut module).run(PatchMode::Patch)?;
    assert_ne!(module, original);

    let outcome = Patcher::new(&mut module).run(PatchMode::UnPatch)?;
    assert_eq!(outcome, PatchOutcome::Unpatched);

    // Identical type set, instruction stream, and attribute set
    assert_eq!(module, original);
    Ok(())
}

#[test]
fn patch_survives_serialization_and_still_unpatches() -> Result<()> {
    let original = target_module();

    let mut module = original.clone();
    Patcher::new(&mut module).run(PatchMode::Patch)?;

    // Persist the patched module and reload it, as separate invocations would
    let mut reloaded = Module::from_bytes(&module.to_bytes()?)?;

    let info = Patcher::new(&mut reloaded).run(PatchMode::Info)?;
    assert!(matches!(info, PatchOutcome::Info(Some(_))));

    Patcher::new(&mut reloaded).run(PatchMode::UnPatch)?;
    assert_eq!(reloaded, original);
    Ok(())
}

#[test]
fn patch_on_patched_module_fails_without_mutation() -> Result<()> {
    let mut module = target_module();
    Patcher::new(&mut module).run(PatchMode::Patch)?;

    let snapshot = module.clone();
    let result = Patcher::new(&mut module).run(PatchMode::Patch);

    assert!(matches!(result, Err(Error::AlreadyPatched)));
    assert_eq!(module, snapshot);
    Ok(())
}

#[test]
fn unpatch_on_unpatched_module_fails_without_mutation() {
    let mut module = target_module();
    let snapshot = module.clone();

    let result = Patcher::new(&mut module).run(PatchMode::UnPatch);
    assert!(matches!(result, Err(Error::NotPatched)));
    assert_eq!(module, snapshot);

    let result = Patcher::new(&mut module).run(PatchMode::RePatch);
    assert!(matches!(result, Err(Error::NotPatched)));
    assert_eq!(module, snapshot);
}

#[test]
fn info_reports_descriptor_after_patch() -> Result<()> {
    let mut module = target_module();

    // Unpatched: Info reports nothing and never requires a write
    let outcome = Patcher::new(&mut module).run(PatchMode::Info)?;
    assert_eq!(outcome, PatchOutcome::Info(None));
    assert!(!outcome.requires_write());

    Patcher::new(&mut module).run(PatchMode::Patch)?;

    let outcome = Patcher::new(&mut module).run(PatchMode::Info)?;
    let PatchOutcome::Info(Some(descriptor)) = outcome else {
        panic!("expected a descriptor");
    };
    assert_eq!(descriptor.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(descriptor.start_index, 0);
    assert_eq!(descriptor.end_index, 1);
    Ok(())
}

#[test]
fn every_mode_fails_on_missing_target() {
    let mut module = Module::new("Empty");
    module.add_type(CilType::new("Game", "SomethingElse", TypeVisibility::PUBLIC));
    let snapshot = module.clone();

    for mode in [
        PatchMode::Patch,
        PatchMode::ForcePatch,
        PatchMode::RePatch,
        PatchMode::UnPatch,
        PatchMode::Info,
    ] {
        let result = Patcher::new(&mut module).run(mode);
        assert!(
            matches!(result, Err(Error::TargetNotFound { .. })),
            "mode {mode} must fail on a missing target"
        );
        assert_eq!(module, snapshot, "mode {mode} must not mutate");
    }
}

#[test]
fn type_without_the_method_is_not_a_target() {
    let mut module = Module::new("Half");
    let mut ty = CilType::new("Game.Ui", "StartupScreenController", TypeVisibility::PUBLIC);
    ty.methods
        .push(Method::new("Start", MemberAccessFlags::PRIVATE));
    module.add_type(ty);

    let result = Patcher::new(&mut module).run(PatchMode::Info);
    assert!(matches!(result, Err(Error::TargetNotFound { .. })));
}

#[test]
fn forcepatch_converges_from_any_state() -> Result<()> {
    let registry = MarkerRegistry::new();
    let bootstrap_ref = MethodRef::new(
        "Game.Ui.StartupScreenController",
        bootstrap::BOOTSTRAP_METHOD_NAME,
    );

    // Starting unpatched, then forcing repeatedly
    let mut module = target_module();
    for _ in 0..3 {
        let outcome = Patcher::new(&mut module).run(PatchMode::ForcePatch)?;
        assert!(matches!(outcome, PatchOutcome::Patched(_)));

        let instructions = awake_instructions(&module);
        let call_count = instructions
            .iter()
            .filter(|i| i.is_call_to(&bootstrap_ref))
            .count();
        assert_eq!(call_count, 1);

        let controller = module.find_type("Game.Ui.StartupScreenController").unwrap();
        let descriptor_count = controller
            .find_method("Awake")
            .unwrap()
            .custom_attributes
            .iter()
            .filter(|a| a.is(registry.full_name(MarkerKind::Patched)))
            .count();
        assert_eq!(descriptor_count, 1);
    }

    Ok(())
}

#[test]
fn repatch_refreshes_the_patch() -> Result<()> {
    let mut module = target_module();
    Patcher::new(&mut module).run(PatchMode::Patch)?;
    let patched_snapshot = module.clone();

    let outcome = Patcher::new(&mut module).run(PatchMode::RePatch)?;
    assert!(matches!(outcome, PatchOutcome::Patched(_)));

    // Re-applying the same version over the same target reproduces the same graph
    assert_eq!(module, patched_snapshot);
    Ok(())
}
