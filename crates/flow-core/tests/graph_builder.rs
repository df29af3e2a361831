use flow_core::{ArtifactKind, ArtifactSlot, BuildError, Constraint, GraphBuilder, GraphError, ParamSpec,
                ParamValue, ParameterError, StageContext, StageDefinition, StageError, StageKind, StageRun};

/// Stage configurable para los tests de cableado.
#[derive(Debug)]
struct FakeStage {
    id: &'static str,
    inputs: Vec<ArtifactSlot>,
    outputs: Vec<ArtifactSlot>,
    params: Vec<ParamSpec>,
}

impl FakeStage {
    fn new(id: &'static str) -> Self {
        Self { id,
               inputs: vec![],
               outputs: vec![],
               params: vec![] }
    }
    fn input(mut self, name: &'static str, kind: ArtifactKind) -> Self {
        self.inputs.push(ArtifactSlot::new(name, kind));
        self
    }
    fn output(mut self, name: &'static str, kind: ArtifactKind) -> Self {
        self.outputs.push(ArtifactSlot::new(name, kind));
        self
    }
    fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }
}

impl StageDefinition for FakeStage {
    fn id(&self) -> &'static str {
        self.id
    }
    fn kind(&self) -> StageKind {
        if self.inputs.is_empty() {
            StageKind::Source
        } else {
            StageKind::Transform
        }
    }
    fn inputs(&self) -> Vec<ArtifactSlot> {
        self.inputs.clone()
    }
    fn outputs(&self) -> Vec<ArtifactSlot> {
        self.outputs.clone()
    }
    fn parameters(&self) -> Vec<ParamSpec> {
        self.params.clone()
    }
    fn run(&self, _ctx: &StageContext<'_>) -> Result<StageRun, StageError> {
        Ok(StageRun::new())
    }
}

fn seed() -> ParamSpec {
    ParamSpec::int("seed", 42)
}

fn fraction() -> ParamSpec {
    ParamSpec::float("testFraction", 0.2).with_constraint(Constraint::OpenInterval { min: 0.0, max: 1.0 })
}

fn linear() -> GraphBuilder {
    GraphBuilder::new("linear", "three stages")
        // declarado fuera de orden a propósito
        .stage(FakeStage::new("c").input("split", ArtifactKind::Dataset)
                                  .output("model", ArtifactKind::Model)
                                  .param(seed()))
        .stage(FakeStage::new("a").output("raw", ArtifactKind::Dataset))
        .stage(FakeStage::new("b").input("raw", ArtifactKind::Dataset)
                                  .output("split", ArtifactKind::Dataset)
                                  .param(seed())
                                  .param(fraction()))
}

#[test]
fn wires_by_channel_name_and_orders_topologically() {
    let graph = linear().build().expect("valid graph");
    assert!(graph.is_validated());
    let order: Vec<&str> = graph.stages().map(|s| s.id()).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(graph.upstream_of("c"), vec!["b"]);
    assert_eq!(graph.edges().len(), 2);

    let seed = &graph.parameters()["seed"];
    assert_eq!(seed.value, ParamValue::Int(42));
    assert_eq!(seed.used_by, vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn upstream_stages_are_sorted_and_deduplicated() {
    let graph = GraphBuilder::new("diamond", "")
        .stage(FakeStage::new("join").input("left", ArtifactKind::Dataset)
                                     .input("right", ArtifactKind::Dataset)
                                     .input("model", ArtifactKind::Model))
        .stage(FakeStage::new("split").output("left", ArtifactKind::Dataset)
                                      .output("right", ArtifactKind::Dataset))
        .stage(FakeStage::new("fit").output("model", ArtifactKind::Model))
        .build()
        .unwrap();
    // el resultado sólo toma prestado el grafo, no el id consultado
    let upstream = {
        let id = String::from("join");
        graph.upstream_of(&id)
    };
    assert_eq!(upstream, vec!["fit", "split"]);
    assert!(graph.upstream_of("split").is_empty());
    assert!(graph.upstream_of("missing").is_empty());
}

#[test]
fn falls_back_to_unique_kind_match() {
    let graph = GraphBuilder::new("kind", "")
        .stage(FakeStage::new("train").output("model", ArtifactKind::Model))
        .stage(FakeStage::new("score").input("classifier", ArtifactKind::Model))
        .build()
        .unwrap();
    let edge = &graph.edges()[0];
    assert_eq!((edge.from_stage.as_str(), edge.output.as_str(), edge.input.as_str()),
               ("train", "model", "classifier"));
}

#[test]
fn missing_producer_is_graph_error() {
    let err = GraphBuilder::new("g", "")
        .stage(FakeStage::new("eval").input("model", ArtifactKind::Model))
        .build()
        .unwrap_err();
    assert_eq!(err,
               BuildError::Graph(GraphError::UnsatisfiedInput { stage: "eval".into(),
                                                                input: "model".into() }));
}

#[test]
fn two_producers_for_one_input_is_ambiguous() {
    let err = GraphBuilder::new("g", "")
        .stage(FakeStage::new("x").output("train_data", ArtifactKind::Dataset))
        .stage(FakeStage::new("y").output("test_data", ArtifactKind::Dataset))
        .stage(FakeStage::new("z").input("table", ArtifactKind::Dataset))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Graph(GraphError::AmbiguousInput { ref producers, .. }) if producers.len() == 2),
            "{err:?}");
}

#[test]
fn name_match_with_wrong_kind_is_rejected() {
    let err = GraphBuilder::new("g", "")
        .stage(FakeStage::new("x").output("model", ArtifactKind::Dataset))
        .stage(FakeStage::new("y").input("model", ArtifactKind::Model))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Graph(GraphError::KindMismatch { .. })));
}

#[test]
fn cycle_is_detected() {
    let err = GraphBuilder::new("g", "")
        .stage(FakeStage::new("a").input("m", ArtifactKind::Model)
                                  .output("d", ArtifactKind::Dataset))
        .stage(FakeStage::new("b").input("d", ArtifactKind::Dataset)
                                  .output("m", ArtifactKind::Model))
        .build()
        .unwrap_err();
    match err {
        BuildError::Graph(GraphError::Cycle(stages)) => assert_eq!(stages, vec!["a".to_string(), "b".to_string()]),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn empty_and_duplicate_graphs_are_rejected() {
    assert_eq!(GraphBuilder::new("g", "").build().unwrap_err(), BuildError::Graph(GraphError::Empty));
    let err = GraphBuilder::new("g", "").stage(FakeStage::new("a"))
                                        .stage(FakeStage::new("a"))
                                        .build()
                                        .unwrap_err();
    assert_eq!(err, BuildError::Graph(GraphError::DuplicateStage("a".into())));
}

#[test]
fn out_of_domain_parameter_fails_before_anything_runs() {
    let err = linear().param("testFraction", 1.5).build().unwrap_err();
    match err {
        BuildError::Parameter(ParameterError::ConstraintViolated { name, value, .. }) => {
            assert_eq!(name, "testFraction");
            assert_eq!(value, "1.5");
        }
        other => panic!("expected parameter error, got {other:?}"),
    }
}

#[test]
fn unknown_parameter_is_rejected() {
    let err = linear().param("nEstimators", 3).build().unwrap_err();
    assert_eq!(err, BuildError::Parameter(ParameterError::Unknown { name: "nEstimators".into() }));
}

#[test]
fn conflicting_declarations_are_rejected() {
    let err = GraphBuilder::new("g", "")
        .stage(FakeStage::new("a").output("d", ArtifactKind::Dataset)
                                  .param(ParamSpec::int("seed", 1)))
        .stage(FakeStage::new("b").input("d", ArtifactKind::Dataset)
                                  .param(ParamSpec::int("seed", 2)))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Graph(GraphError::ConflictingParameter { .. })));
}

#[test]
fn stage_params_only_carry_declared_names() {
    let graph = linear().param("seed", 7).build().unwrap();
    let c = graph.stage_params("c").unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c.int("seed").unwrap(), 7);
    let b = graph.stage_params("b").unwrap();
    assert_eq!(b.float("testFraction").unwrap(), 0.2);
}

#[test]
fn draft_is_not_validated() {
    let draft = linear().draft();
    assert!(!draft.is_validated());
    assert!(draft.edges().is_empty());
}
