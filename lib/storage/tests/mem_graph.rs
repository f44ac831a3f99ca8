use insta::assert_snapshot;
use kgram_common::error::StorageError;
use kgram_common::GraphIndex;
use kgram_model::{
    BlankNode, GraphName, Literal, NamedNode, Node, Position, Quad, Subject, Term,
};
use kgram_storage::MemGraph;

fn iri(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
}

fn example_graph() -> MemGraph {
    let mut graph = MemGraph::new();
    graph.insert(iri("alice"), iri("knows"), iri("bob"), None).unwrap();
    graph
        .insert(iri("alice"), iri("knows"), iri("bob"), Some(iri("g1")))
        .unwrap();
    graph.insert(iri("alice"), iri("knows"), iri("carol"), None).unwrap();
    graph
        .insert(iri("bob"), iri("knows"), iri("carol"), Some(iri("g2")))
        .unwrap();
    graph
        .insert(iri("bob"), iri("name"), Literal::new_simple_literal("Bob").into(), None)
        .unwrap();
    graph
}

fn render(entities: impl Iterator<Item = kgram_model::Entity>) -> String {
    entities
        .map(|entity| entity.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn insert_duplicate_has_no_effect() {
    let mut graph = example_graph();
    assert_eq!(graph.len(), 5);
    let inserted = graph
        .insert(iri("alice"), iri("knows"), iri("bob"), None)
        .unwrap();
    assert!(!inserted);
    assert_eq!(graph.len(), 5);
}

#[test]
fn insert_quads() {
    let mut graph = MemGraph::new();
    let quad = Quad::new(
        Subject::BlankNode(BlankNode::new_unchecked("b0")),
        NamedNode::new_unchecked("http://example.com/p"),
        Literal::from(1),
        GraphName::NamedNode(NamedNode::new_unchecked("http://example.com/g")),
    );
    assert_eq!(graph.extend([quad.as_ref(), quad.as_ref()]).unwrap(), 1);
    assert_eq!(graph.graph_nodes(), vec![Node::external(iri("g"))]);
}

#[test]
fn invalid_terms_are_rejected() {
    let mut graph = MemGraph::new();
    let literal = Term::from(Literal::new_simple_literal("x"));

    let result = graph.insert(literal.clone(), iri("p"), iri("o"), None);
    assert!(matches!(
        result,
        Err(StorageError::InvalidTerm {
            position: Position::Subject,
            ..
        })
    ));

    let result = graph.insert(iri("s"), literal.clone(), iri("o"), None);
    assert!(matches!(result, Err(StorageError::InvalidPredicate(_))));

    let result = graph.insert(iri("s"), iri("p"), iri("o"), Some(literal));
    assert!(matches!(
        result,
        Err(StorageError::InvalidTerm {
            position: Position::Graph,
            ..
        })
    ));
    assert!(graph.is_empty());
}

#[test]
fn subject_lookup_keeps_occurrences_adjacent() {
    let graph = example_graph();
    let knows = graph.property_node(&iri("knows")).unwrap();
    let alice = graph.node(&iri("alice")).unwrap();

    assert_snapshot!(
        render(graph.edges_for(&knows, Some(&alice), None, Position::Subject)),
        @r"
    <http://example.com/alice> <http://example.com/knows> <http://example.com/bob>
    <http://example.com/alice> <http://example.com/knows> <http://example.com/bob> <http://example.com/g1>
    <http://example.com/alice> <http://example.com/knows> <http://example.com/carol>
    "
    );
}

#[test]
fn object_lookup_with_second_key() {
    let graph = example_graph();
    let knows = graph.property_node(&iri("knows")).unwrap();
    let carol = graph.node(&iri("carol")).unwrap();
    let bob = graph.node(&iri("bob")).unwrap();

    assert_snapshot!(
        render(graph.edges_for(&knows, Some(&carol), Some(&bob), Position::Object)),
        @"<http://example.com/bob> <http://example.com/knows> <http://example.com/carol> <http://example.com/g2>"
    );
}

#[test]
fn graph_lookup() {
    let graph = example_graph();
    let knows = graph.property_node(&iri("knows")).unwrap();
    let g1 = graph.graph_node(&iri("g1")).unwrap();

    assert_snapshot!(
        render(graph.edges_for(&knows, Some(&g1), None, Position::Graph)),
        @"<http://example.com/alice> <http://example.com/knows> <http://example.com/bob> <http://example.com/g1>"
    );
}

#[test]
fn unknown_nodes_yield_nothing() {
    let graph = example_graph();
    let knows = graph.property_node(&iri("knows")).unwrap();
    let unknown = Node::external(iri("dave"));

    assert_eq!(
        graph
            .edges_for(&knows, Some(&unknown), None, Position::Subject)
            .count(),
        0
    );
    let alice = graph.node(&iri("alice")).unwrap();
    assert_eq!(
        graph
            .edges_for(&knows, Some(&alice), Some(&unknown), Position::Subject)
            .count(),
        0
    );
    assert_eq!(
        graph
            .edges_for(&unknown, None, None, Position::Subject)
            .count(),
        0
    );
    assert!(graph.property_node(&iri("alice")).is_none());
}

#[test]
fn external_nodes_resolve_against_the_dictionary() {
    let graph = example_graph();
    let knows = Node::external(iri("knows"));
    let alice = Node::external(iri("alice"));
    assert_eq!(
        graph
            .edges_for(&knows, Some(&alice), None, Position::Subject)
            .count(),
        3
    );
}

#[test]
fn predicates_graphs_and_nodes() {
    let graph = example_graph();
    assert_eq!(
        graph.predicates(),
        vec![Node::external(iri("knows")), Node::external(iri("name"))]
    );
    assert!(graph.is_graph_node(&Node::external(iri("g2"))));
    assert!(!graph.is_graph_node(&Node::external(iri("alice"))));
    assert!(graph.graph_node(&iri("alice")).is_none());

    let g2 = graph.graph_node(&iri("g2")).unwrap();
    assert_eq!(
        graph.nodes(Some(&g2)),
        vec![Node::external(iri("bob")), Node::external(iri("carol"))]
    );
    assert_eq!(graph.nodes(None).len(), 4);
}

#[test]
fn entailment_is_a_graph_property() {
    assert!(!MemGraph::new().has_entailment());
    assert!(MemGraph::new().with_entailment(true).has_entailment());
}
