// Shared fixtures for the integration tests

#![allow(dead_code)]

use model_system_editor::{
    DefaultValueParser, EditingSession, ModelSystem, ModuleDescriptor, ModuleType,
    ParameterDescriptor, SlotDescriptor, StaticCatalog, StructureModel, TypeConstraint,
    ValueType,
};
use std::sync::Arc;

pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with(
            ModuleDescriptor::new("Travel.Demand")
                .implements("IModelSystemTemplate")
                .parameter(ParameterDescriptor::new("Iterations", ValueType::Integer, "1"))
                .slot(SlotDescriptor::collection("Modes", TypeConstraint::new("IMode")))
                .slot(SlotDescriptor::single("Network", TypeConstraint::new("INetwork"))),
        )
        .with(
            ModuleDescriptor::new("Travel.ActivityDemand")
                .implements("IModelSystemTemplate")
                .slot(SlotDescriptor::collection("Modes", TypeConstraint::new("IMode")))
                .slot(SlotDescriptor::single("Zones", TypeConstraint::new("IZoneSystem"))),
        )
        .with(
            ModuleDescriptor::new("Travel.Auto")
                .implements("IMode")
                .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0"))
                .parameter(ParameterDescriptor::new("Occupancy", ValueType::Integer, "1")),
        )
        .with(
            ModuleDescriptor::new("Travel.Transit")
                .implements("IMode")
                .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0"))
                .requires_root("IModelSystemTemplate"),
        )
        .with(
            ModuleDescriptor::new("Travel.Walk")
                .implements("IMode")
                .requires_parent("INetwork"),
        )
        .with(
            ModuleDescriptor::new("Travel.RoadNetwork")
                .implements("INetwork")
                .parameter(ParameterDescriptor::new("Lanes", ValueType::Integer, "2")),
        )
        .with(ModuleDescriptor::new("Travel.Zones").implements("IZoneSystem"))
}

pub fn empty_model() -> ModelSystem {
    ModelSystem::new(
        "Regional Model",
        TypeConstraint::new("IModelSystemTemplate"),
        Arc::new(catalog()),
        Arc::new(DefaultValueParser),
    )
}

/// Session whose root is a `Travel.Demand` with a road network, history cleared
pub fn demand_session() -> EditingSession {
    let session = EditingSession::new(empty_model());
    let root = session.root_structure();
    root.set_type(Some(ModuleType::new("Travel.Demand")))
        .unwrap();
    root.child(1)
        .unwrap()
        .set_type(Some(ModuleType::new("Travel.RoadNetwork")))
        .unwrap();
    session.reset_history();
    session
}

pub fn modes(session: &EditingSession) -> StructureModel<'_> {
    session.root_structure().child(0).unwrap()
}

pub fn child_names(node: &StructureModel<'_>) -> Vec<String> {
    node.children().iter().map(|c| c.name()).collect()
}
