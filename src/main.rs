// Model System Editor demo
// Run with: cargo run -- [session-config.ron]

use model_system_editor::{
    DefaultValueParser, EditingSession, ModelSystem, ModuleDescriptor, ModuleType,
    ParameterDescriptor, RonFileStore, SessionConfig, SlotDescriptor, StaticCatalog,
    TypeConstraint, ValueType,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,model_system_editor=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn demo_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with(
            ModuleDescriptor::new("Travel.DemandModel")
                .implements("IModelSystemTemplate")
                .parameter(ParameterDescriptor::new("Iterations", ValueType::Integer, "3"))
                .slot(SlotDescriptor::collection("Modes", TypeConstraint::new("IMode")))
                .slot(SlotDescriptor::single("Network", TypeConstraint::new("INetwork"))),
        )
        .with(
            ModuleDescriptor::new("Travel.AutoMode")
                .implements("IMode")
                .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0").quick())
                .parameter(ParameterDescriptor::new("Label", ValueType::Text, "car")),
        )
        .with(
            ModuleDescriptor::new("Travel.TransitMode")
                .implements("IMode")
                .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0"))
                .requires_root("IModelSystemTemplate"),
        )
        .with(
            ModuleDescriptor::new("Travel.RoadNetwork")
                .implements("INetwork")
                .parameter(ParameterDescriptor::new("Lanes", ValueType::Integer, "2")),
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    println!("=== Model System Editor ===");
    let model = ModelSystem::new(
        "Demo",
        TypeConstraint::new("IModelSystemTemplate"),
        Arc::new(demo_catalog()),
        Arc::new(DefaultValueParser),
    );
    let session = EditingSession::with_config(model, config)?;
    if session.config().store_path.is_none() {
        session.set_store(RonFileStore::new(
            std::env::temp_dir().join("model_system_editor_demo.ron"),
        ));
    }

    let root = session.root_structure();
    root.set_type(Some(ModuleType::new("Travel.DemandModel")))?;
    let modes = root.child(0).ok_or("demand model has no Modes slot")?;
    let network = root.child(1).ok_or("demand model has no Network slot")?;
    network.set_type(Some(ModuleType::new("Travel.RoadNetwork")))?;

    let auto = modes.add(ModuleType::new("Travel.AutoMode"), None)?;
    let transit = modes.add(ModuleType::new("Travel.TransitMode"), Some("Bus"))?;

    let speed = session.linked_parameters().create("Speed", "40")?;
    for mode in [&auto, &transit] {
        if let Some(parameter) = mode.parameter("Speed") {
            speed.add_parameter(parameter.id())?;
        }
    }
    speed.set_value("55")?;
    modes.move_child(0, 1)?;

    println!("\nModes:");
    for mode in modes.children() {
        let speed = mode.parameter("Speed").map(|p| p.value()).unwrap_or_default();
        println!("   - {} (speed {})", mode.name(), speed);
    }

    if let Err(e) = network.set_type(Some(ModuleType::new("Travel.AutoMode"))) {
        println!("\nRejected edit: {}", e);
    }

    println!("\nUndo history (newest first):");
    for description in session.undo_descriptions() {
        println!("   - {}", description);
    }

    let undone = session.undo()?;
    println!("\nUndid '{}'", undone);
    session.redo()?;

    session.save()?;
    println!(
        "\nSaved {} modules, {} linked parameters",
        session.document().module_count(),
        session.linked_parameters().len()
    );

    session.close()?;
    Ok(())
}
