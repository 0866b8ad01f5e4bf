//! Contexts shared by the diagnostic unit tests

use crate::context::{BeatFunction, Connector, DiagnosticContext, Scene};

/// Five scenes joined by BUT/THEREFORE/THEREFORE/THEREFORE
pub(crate) fn causal_context() -> DiagnosticContext {
    let scenes = vec![
        Scene::new(1, "INT. HOUSE - DAY", "Maya finds her father's map hidden in the attic")
            .with_function(BeatFunction::Setup)
            .with_connector(Connector::But)
            .with_characters(["MAYA"])
            .with_tension(2),
        Scene::new(2, "EXT. HARBOR - DAY", "The harbor master refuses to rent her a boat")
            .with_function(BeatFunction::Incite)
            .with_connector(Connector::Therefore)
            .with_characters(["MAYA", "HARBOR MASTER"])
            .with_tension(4),
        Scene::new(3, "EXT. SEA - NIGHT", "She steals a dinghy and rows into the storm")
            .with_function(BeatFunction::Escalate)
            .with_connector(Connector::Therefore)
            .with_characters(["MAYA"])
            .with_tension(7),
        Scene::new(4, "EXT. ISLAND - DAWN", "Shipwrecked, she must trust the smuggler who followed her")
            .with_function(BeatFunction::Crisis)
            .with_connector(Connector::Therefore)
            .with_characters(["MAYA", "SMUGGLER"])
            .with_tension(8),
        Scene::new(5, "INT. CAVE - DAY", "Together they open the vault and face what her father hid")
            .with_function(BeatFunction::Climax)
            .with_characters(["MAYA", "SMUGGLER"])
            .with_tension(10),
    ];
    DiagnosticContext::new("The Map", scenes, vec!["MAYA".into(), "SMUGGLER".into()])
}

/// Three scenes strung together with AND THEN
pub(crate) fn episodic_context() -> DiagnosticContext {
    let scenes = vec![
        Scene::new(1, "INT. DINER - DAY", "Sam eats breakfast")
            .with_function(BeatFunction::Breathe)
            .with_connector(Connector::AndThen)
            .with_characters(["SAM"])
            .with_tension(2),
        Scene::new(2, "EXT. PARK - DAY", "Sam walks the dog")
            .with_function(BeatFunction::Breathe)
            .with_connector(Connector::AndThen)
            .with_characters(["SAM"])
            .with_tension(2),
        Scene::new(3, "INT. HOME - NIGHT", "Sam watches television")
            .with_function(BeatFunction::Breathe)
            .with_characters(["SAM"])
            .with_tension(2),
    ];
    DiagnosticContext::new("Errands", scenes, vec!["SAM".into()])
}

pub(crate) fn empty_context() -> DiagnosticContext {
    DiagnosticContext::new("Empty", vec![], vec![])
}

pub(crate) fn single_scene_context() -> DiagnosticContext {
    DiagnosticContext::new(
        "Solo",
        vec![Scene::new(1, "INT. ROOM - DAY", "A single scene")],
        vec![],
    )
}
