use std::fs;

use cooccurrence_network::{
    AnalysisConfig, CentralityMeasure, NetworkError, Pipeline, tokens::parse_tokens,
};

const CORPUS: &str = "
    onboarding program mentor feedback onboarding culture mentor goal
    onboarding mentor feedback training curriculum evaluation training
    curriculum evaluation manager team goal team manager culture onboarding
    mentor feedback training curriculum evaluation onboarding program mentor
    team manager goal culture team manager goal feedback onboarding mentor onboarding
";

fn config_in(dir: &std::path::Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::from_toml_str(
        r#"
        [network]
        window_size = 3
        min_node_freq = 2
        min_edge_weight = 2

        [display]
        max_nodes_display = 5

        [output]
        render = false
        "#,
    )
    .unwrap();
    config.output.dir = dir.join("results");
    config
}

#[test]
fn full_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let tokens = parse_tokens(CORPUS);

    let outcome = Pipeline::new(config.clone()).unwrap().run(&tokens).unwrap();

    assert_eq!(outcome.token_count, tokens.len());
    assert_eq!(outcome.report.nodes, outcome.graph.node_count());
    assert!(outcome.report.edges > 0);
    assert!(outcome.report.centrality.is_some());
    assert_eq!(outcome.partition.len(), outcome.graph.node_count());
    assert_eq!(outcome.top_keywords[0].name, "onboarding");

    // metrics stay on the full graph while the figure is capped
    assert!(outcome.graph.node_count() > 5);
    assert_eq!(outcome.display_nodes, 5);
    let degree = outcome.report.table(CentralityMeasure::Degree).unwrap();
    assert_eq!(degree.len(), outcome.graph.node_count());

    let artifacts = &outcome.artifacts;
    for path in [&artifacts.nodes, &artifacts.edges, &artifacts.communities, &artifacts.metrics] {
        assert!(path.starts_with(&config.output.dir));
        assert!(path.exists(), "{} missing", path.display());
    }
    let dot = fs::read_to_string(artifacts.dot.as_ref().unwrap()).unwrap();
    assert!(dot.contains("showing 5 of"));
    assert!(artifacts.image.is_none());
    assert!(outcome.render_error.is_none());

    let nodes = fs::read_to_string(&artifacts.nodes).unwrap();
    assert_eq!(nodes.lines().count(), outcome.graph.node_count() + 1);

    let summary = outcome.to_string();
    assert!(summary.contains("Network nodes:"));
    assert!(summary.contains("1. onboarding"));
    assert!(summary.contains("Figure shows the 5 most frequent"));
}

#[test]
fn identical_runs_produce_identical_files() {
    let tokens = parse_tokens(CORPUS);
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();

    let first = Pipeline::new(config_in(a.path())).unwrap().run(&tokens).unwrap();
    let second = Pipeline::new(config_in(b.path())).unwrap().run(&tokens).unwrap();

    assert_eq!(first.graph, second.graph);
    assert_eq!(first.partition, second.partition);
    for (x, y) in [
        (&first.artifacts.nodes, &second.artifacts.nodes),
        (&first.artifacts.edges, &second.artifacts.edges),
        (&first.artifacts.communities, &second.artifacts.communities),
        (&first.artifacts.metrics, &second.artifacts.metrics),
    ] {
        assert_eq!(fs::read_to_string(x).unwrap(), fs::read_to_string(y).unwrap());
    }
}

#[test]
fn empty_input_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let tokens: Vec<String> = Vec::new();

    let outcome = Pipeline::new(config_in(dir.path())).unwrap().run(&tokens).unwrap();

    assert!(outcome.graph.is_empty());
    assert_eq!(outcome.report.nodes, 0);
    assert_eq!(outcome.report.density, 0.0);
    assert_eq!(outcome.report.average_clustering, 0.0);
    assert!(outcome.report.centrality.is_none());
    assert!(outcome.partition.is_empty());
    assert!(outcome.top_keywords.is_empty());
}

#[test]
fn rendering_either_produces_an_image_or_reports_why() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.output.render = true;

    let outcome = Pipeline::new(config).unwrap().run(&parse_tokens(CORPUS)).unwrap();

    assert!(outcome.artifacts.dot.is_some());
    assert_ne!(outcome.artifacts.image.is_some(), outcome.render_error.is_some());
}

#[test]
fn invalid_configuration_fails_before_running() {
    let mut config = AnalysisConfig::default();
    config.network.window_size = 1;
    assert!(matches!(Pipeline::new(config), Err(NetworkError::InvalidConfig(_))));

    let mut config = AnalysisConfig::default();
    config.network.min_edge_weight = 0;
    assert!(Pipeline::new(config).is_err());
}
