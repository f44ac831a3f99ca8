use kgram_common::GraphIndex;
use kgram_engine::{EvaluationOptions, Memory, PathRequest, Producer};
use kgram_logical::{EdgePattern, GraphPattern, PathExpr, PathPattern, PatternNode, Query};
use kgram_model::vocab::{rdf, rdfs};
use kgram_model::{Entity, NamedNode, Node, Position, Term, Variable};
use kgram_storage::MemGraph;
use std::sync::Arc;

fn iri(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn example_graph() -> MemGraph {
    let mut graph = MemGraph::new();
    graph.insert(iri("a"), iri("p"), iri("b"), None).unwrap();
    graph.insert(iri("a"), iri("p"), iri("c"), None).unwrap();
    graph
        .insert(iri("a"), iri("p"), iri("b"), Some(iri("g1")))
        .unwrap();
    graph.insert(iri("b"), iri("q"), iri("c"), None).unwrap();
    graph
}

fn producer(graph: MemGraph, options: EvaluationOptions) -> Producer {
    let graph: Arc<dyn GraphIndex> = Arc::new(graph);
    Producer::new(graph, options)
}

fn query(pattern: &EdgePattern) -> Query {
    Query::builder(GraphPattern::Graph {
        name: PatternNode::Variable(var("g")),
        inner: Box::new(GraphPattern::Edge(pattern.clone())),
    })
    .build()
}

fn render(entities: impl Iterator<Item = Entity>) -> Vec<String> {
    entities.map(|entity| entity.to_string()).collect()
}

#[test]
fn constant_unknown_to_the_graph_yields_nothing() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(iri("z"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(producer.match_edge(&pattern, None, &[], &memory).count(), 0);
}

#[test]
fn bound_variable_unknown_to_the_graph_yields_nothing() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let mut memory = Memory::new(&query);
    memory
        .bind(&var("x"), &Node::external(iri("z")))
        .unwrap();

    assert_eq!(producer.match_edge(&pattern, None, &[], &memory).count(), 0);
}

#[test]
fn unknown_predicate_yields_nothing() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("unknown"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(producer.match_edge(&pattern, None, &[], &memory).count(), 0);
}

#[test]
fn unknown_graph_yields_nothing() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);
    let graph_node = PatternNode::Constant(iri("g9"));

    assert_eq!(
        producer
            .match_edge(&pattern, Some(&graph_node), &[], &memory)
            .count(),
        0
    );
}

#[test]
fn duplicates_of_named_graphs_are_collapsed() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(
        render(producer.match_edge(&pattern, None, &[], &memory)),
        vec![
            "<http://example.com/a> <http://example.com/p> <http://example.com/b>",
            "<http://example.com/a> <http://example.com/p> <http://example.com/c>",
        ]
    );
}

#[test]
fn skipping_the_duplicate_test_keeps_all_occurrences() {
    let options = EvaluationOptions::default().with_skip_duplicate_test(true);
    let producer = producer(example_graph(), options);
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(producer.match_edge(&pattern, None, &[], &memory).count(), 3);
}

#[test]
fn unbound_predicate_scans_all_predicates() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), var("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(producer.match_edge(&pattern, None, &[], &memory).count(), 3);
}

#[test]
fn graph_node_restricts_to_named_graphs() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);
    let graph_node = PatternNode::Variable(var("g"));

    assert_eq!(
        render(producer.match_edge(&pattern, Some(&graph_node), &[], &memory)),
        vec![
            "<http://example.com/a> <http://example.com/p> <http://example.com/b> \
             <http://example.com/g1>"
        ]
    );
}

#[test]
fn from_restricts_the_default_graph() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let pattern = EdgePattern::new(var("x"), iri("p"), var("y"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    assert_eq!(
        producer
            .match_edge(&pattern, None, &[iri("g1")], &memory)
            .count(),
        1
    );
    assert_eq!(
        producer
            .match_edge(&pattern, None, &[iri("g9")], &memory)
            .count(),
        0
    );
}

fn type_graph() -> MemGraph {
    let mut graph = MemGraph::new().with_entailment(true);
    let rdf_type = Term::from(rdf::TYPE.into_owned());
    graph
        .insert(iri("alice"), rdf_type.clone(), iri("Student"), None)
        .unwrap();
    graph
        .insert(iri("bob"), rdf_type, iri("Employee"), None)
        .unwrap();
    graph
        .insert(
            iri("Student"),
            rdfs::SUB_CLASS_OF.into_owned().into(),
            iri("Person"),
            None,
        )
        .unwrap();
    graph
}

#[test]
fn type_edges_match_subclasses_with_type_matching() {
    let pattern = EdgePattern::new(var("x"), Term::from(rdf::TYPE.into_owned()), iri("Person"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    let matching = producer(
        type_graph(),
        EvaluationOptions::default().with_type_matching(true),
    );
    let entities = matching
        .match_edge(&pattern, None, &[], &memory)
        .collect::<Vec<_>>();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].edge().subject, Node::external(iri("alice")));

    let person = matching.node(&iri("Person"));
    assert!(matching.accepts(&entities[0], Position::Object, &person));
}

#[test]
fn type_edges_need_an_exact_class_without_type_matching() {
    let pattern = EdgePattern::new(var("x"), Term::from(rdf::TYPE.into_owned()), iri("Person"));
    let query = query(&pattern);
    let memory = Memory::new(&query);

    let plain = producer(type_graph(), EvaluationOptions::default());
    let person = plain.node(&iri("Person"));
    let accepted = plain
        .match_edge(&pattern, None, &[], &memory)
        .filter(|entity| plain.accepts(entity, Position::Object, &person))
        .count();
    assert_eq!(accepted, 0);
}

#[test]
fn reverse_path_step_starts_at_the_object() {
    let producer = producer(example_graph(), EvaluationOptions::default());
    let path = PathPattern {
        subject: PatternNode::Variable(var("x")),
        path: PathExpr::Reverse(Box::new(PathExpr::Predicate(NamedNode::new_unchecked(
            "http://example.com/p",
        )))),
        object: PatternNode::Variable(var("y")),
    };
    let query = Query::builder(GraphPattern::Path(path.clone())).build();
    let memory = Memory::new(&query);
    let start = Node::external(iri("c"));

    let request = PathRequest {
        pattern: &path,
        step: &path.path,
        start: Some(&start),
        position: Position::Subject,
        graph_node: None,
        from: &[],
    };
    let position = Producer::effective_index(&path.path, Position::Subject);
    assert_eq!(position, Position::Object);
    let ends = producer
        .match_path(request, &memory)
        .map(|entity| entity.edge().subject.clone())
        .collect::<Vec<_>>();
    assert_eq!(ends, vec![Node::external(iri("a"))]);
}
