#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use kgram::engine::{EvaluationOptions, Mappings, QueryError};
use kgram::functions::ExtensionRegistry;
use kgram::logical::{BinaryOp, Expr, FunctionDefinition, GraphPattern, Query};
use kgram::model::vocab::{rdf, rdfs};
use kgram::model::{Literal, NamedNode, Term, Variable};
use kgram::storage::MemGraph;
use kgram::{QueryProcessor, QueryResults};
use std::error::Error;
use std::sync::Arc;

fn ex(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
}

fn rdf_type() -> Term {
    rdf::TYPE.into_owned().into()
}

fn solutions(processor: &QueryProcessor, query: &str) -> Result<Mappings, Box<dyn Error>> {
    match processor.query(query)? {
        QueryResults::Solutions(solutions) => Ok(solutions),
        QueryResults::Boolean(_) => Err("expected solutions".into()),
    }
}

fn ask(processor: &QueryProcessor, query: &str) -> Result<bool, Box<dyn Error>> {
    match processor.query(query)? {
        QueryResults::Boolean(answer) => Ok(answer),
        QueryResults::Solutions(_) => Err("expected a boolean".into()),
    }
}

/// `:a :p :b` and `:a :p :c`, optionally duplicated in `<g1>`.
fn edges(named: bool) -> Result<QueryProcessor, Box<dyn Error>> {
    let mut graph = MemGraph::new();
    graph.insert(ex("a"), ex("p"), ex("b"), None)?;
    graph.insert(ex("a"), ex("p"), ex("c"), None)?;
    if named {
        graph.insert(ex("a"), ex("p"), ex("b"), Some(ex("g1")))?;
        graph.insert(ex("a"), ex("p"), ex("c"), Some(ex("g1")))?;
    }
    Ok(QueryProcessor::new(Arc::new(graph)))
}

/// `:a :p :b :p :c :p :d` and `:a :q :c`.
fn chain() -> Result<QueryProcessor, Box<dyn Error>> {
    let mut graph = MemGraph::new();
    graph.insert(ex("a"), ex("p"), ex("b"), None)?;
    graph.insert(ex("b"), ex("p"), ex("c"), None)?;
    graph.insert(ex("c"), ex("p"), ex("d"), None)?;
    graph.insert(ex("a"), ex("q"), ex("c"), None)?;
    Ok(QueryProcessor::new(Arc::new(graph)))
}

/// Two persons, only the first one has a name.
fn people() -> Result<QueryProcessor, Box<dyn Error>> {
    let mut graph = MemGraph::new();
    graph.insert(ex("alice"), rdf_type(), ex("Person"), None)?;
    graph.insert(ex("bob"), rdf_type(), ex("Person"), None)?;
    graph.insert(
        ex("alice"),
        ex("name"),
        Literal::new_simple_literal("Alice").into(),
        None,
    )?;
    Ok(QueryProcessor::new(Arc::new(graph)))
}

fn sales() -> Result<QueryProcessor, Box<dyn Error>> {
    let mut graph = MemGraph::new();
    for (sale, region, amount) in [("s1", "north", 10), ("s2", "north", 20), ("s3", "south", 5)] {
        graph.insert(ex(sale), ex("region"), ex(region), None)?;
        graph.insert(ex(sale), ex("amount"), Literal::from(amount).into(), None)?;
    }
    Ok(QueryProcessor::new(Arc::new(graph)))
}

#[test]
fn test_edge_pattern() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    let solutions = solutions(
        &processor,
        "SELECT ?x ?y WHERE { ?x <http://example.com/p> ?y }",
    )?;
    insta::assert_snapshot!(solutions, @r"
    | ?x | ?y |
    | <http://example.com/a> | <http://example.com/b> |
    | <http://example.com/a> | <http://example.com/c> |
    ");
    Ok(())
}

#[test]
fn test_solution_cap() -> Result<(), Box<dyn Error>> {
    let query = "SELECT ?x ?y WHERE { ?x <http://example.com/p> ?y }";
    let capped = edges(false)?.with_options(EvaluationOptions::default().with_limit(Some(1)));
    assert_eq!(solutions(&capped, query)?.len(), 1);

    let none = edges(false)?.with_options(EvaluationOptions::default().with_limit(Some(0)));
    assert!(solutions(&none, query)?.is_empty());
    Ok(())
}

#[test]
fn test_named_graph_duplicates() -> Result<(), Box<dyn Error>> {
    let processor = edges(true)?;

    let in_graphs = solutions(
        &processor,
        "SELECT ?g ?x ?y WHERE { GRAPH ?g { ?x <http://example.com/p> ?y } }",
    )?;
    insta::assert_snapshot!(in_graphs, @r"
    | ?g | ?x | ?y |
    | <http://example.com/g1> | <http://example.com/a> | <http://example.com/b> |
    | <http://example.com/g1> | <http://example.com/a> | <http://example.com/c> |
    ");

    let plain = solutions(
        &processor,
        "SELECT ?x ?y WHERE { ?x <http://example.com/p> ?y }",
    )?;
    assert_eq!(plain.len(), 2);
    Ok(())
}

#[test]
fn test_from_restricts_the_default_graph() -> Result<(), Box<dyn Error>> {
    let processor = edges(true)?;
    let from_g1 = solutions(
        &processor,
        "SELECT ?y FROM <http://example.com/g1> WHERE { ?x <http://example.com/p> ?y }",
    )?;
    assert_eq!(from_g1.len(), 2);
    let from_g2 = solutions(
        &processor,
        "SELECT ?y FROM <http://example.com/g2> WHERE { ?x <http://example.com/p> ?y }",
    )?;
    assert!(from_g2.is_empty());
    Ok(())
}

#[test]
fn test_filter_exists() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;

    let exists = solutions(
        &processor,
        "SELECT ?x WHERE {
            VALUES ?x { <http://example.com/a> <http://example.com/z> }
            FILTER EXISTS { ?x <http://example.com/p> ?y }
        }",
    )?;
    insta::assert_snapshot!(exists, @r"
    | ?x |
    | <http://example.com/a> |
    ");

    let not_exists = solutions(
        &processor,
        "SELECT ?x WHERE {
            VALUES ?x { <http://example.com/a> <http://example.com/z> }
            FILTER NOT EXISTS { ?x <http://example.com/p> ?y }
        }",
    )?;
    insta::assert_snapshot!(not_exists, @r"
    | ?x |
    | <http://example.com/z> |
    ");
    Ok(())
}

#[test]
fn test_select_expression() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    let solutions = solutions(
        &processor,
        "SELECT (?count * 2 AS ?double) WHERE { BIND(5 AS ?count) }",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?double |
    | "10"^^<http://www.w3.org/2001/XMLSchema#integer> |
    "#);
    Ok(())
}

#[test]
fn test_conflicting_select_expression() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    let count = Variable::new_unchecked("count");
    let double = Variable::new_unchecked("double");
    let body = GraphPattern::And(vec![
        GraphPattern::Bind {
            variable: count.clone(),
            expr: Expr::constant(Literal::from(5)),
        },
        GraphPattern::Bind {
            variable: double.clone(),
            expr: Expr::constant(Literal::from(1)),
        },
    ]);
    let query = Query::builder(body)
        .select_expression(
            double.clone(),
            Expr::binary(
                BinaryOp::Multiply,
                Expr::variable(&count),
                Expr::constant(Literal::from(2)),
            ),
        )
        .project(vec![double])
        .build();

    assert!(processor.evaluate(&query)?.is_empty());
    Ok(())
}

#[test]
fn test_unbound_predicate() -> Result<(), Box<dyn Error>> {
    let processor = chain()?;
    let solutions = solutions(
        &processor,
        "SELECT ?p ?o WHERE { <http://example.com/a> ?p ?o }",
    )?;
    insta::assert_snapshot!(solutions, @r"
    | ?p | ?o |
    | <http://example.com/p> | <http://example.com/b> |
    | <http://example.com/q> | <http://example.com/c> |
    ");
    Ok(())
}

#[test]
fn test_type_matching() -> Result<(), Box<dyn Error>> {
    let mut graph = MemGraph::new().with_entailment(true);
    graph.insert(ex("alice"), rdf_type(), ex("Student"), None)?;
    graph.insert(ex("bob"), rdf_type(), ex("Employee"), None)?;
    graph.insert(
        ex("Student"),
        rdfs::SUB_CLASS_OF.into_owned().into(),
        ex("Person"),
        None,
    )?;
    let graph = Arc::new(graph);
    let query = "SELECT ?x WHERE { ?x a <http://example.com/Person> }";

    let exact = QueryProcessor::new(Arc::clone(&graph));
    assert!(solutions(&exact, query)?.is_empty());

    let matching = QueryProcessor::new(graph)
        .with_options(EvaluationOptions::default().with_type_matching(true));
    insta::assert_snapshot!(solutions(&matching, query)?, @r"
    | ?x |
    | <http://example.com/alice> |
    ");
    Ok(())
}

#[test]
fn test_transitive_path() -> Result<(), Box<dyn Error>> {
    let processor = chain()?;

    let reachable = solutions(
        &processor,
        "SELECT ?y WHERE { <http://example.com/a> <http://example.com/p>+ ?y }",
    )?;
    insta::assert_snapshot!(reachable, @r"
    | ?y |
    | <http://example.com/b> |
    | <http://example.com/c> |
    | <http://example.com/d> |
    ");

    let sliced = solutions(
        &processor,
        "SELECT ?y WHERE { <http://example.com/a> <http://example.com/p>+ ?y } OFFSET 1 LIMIT 1",
    )?;
    insta::assert_snapshot!(sliced, @r"
    | ?y |
    | <http://example.com/c> |
    ");

    let with_start = solutions(
        &processor,
        "SELECT ?y WHERE { <http://example.com/a> <http://example.com/p>* ?y }",
    )?;
    assert_eq!(with_start.len(), 4);
    Ok(())
}

#[test]
fn test_reverse_and_negated_paths() -> Result<(), Box<dyn Error>> {
    let processor = chain()?;

    let reverse = solutions(
        &processor,
        "SELECT ?x WHERE { <http://example.com/d> ^<http://example.com/p>+ ?x }",
    )?;
    insta::assert_snapshot!(reverse, @r"
    | ?x |
    | <http://example.com/c> |
    | <http://example.com/b> |
    | <http://example.com/a> |
    ");

    let negated = solutions(
        &processor,
        "SELECT ?y WHERE { <http://example.com/a> !<http://example.com/q> ?y }",
    )?;
    insta::assert_snapshot!(negated, @r"
    | ?y |
    | <http://example.com/b> |
    ");
    Ok(())
}

#[test]
fn test_path_in_named_graphs() -> Result<(), Box<dyn Error>> {
    let processor = edges(true)?;
    let solutions = solutions(
        &processor,
        "SELECT ?g ?y WHERE { GRAPH ?g { <http://example.com/a> <http://example.com/p>+ ?y } }",
    )?;
    insta::assert_snapshot!(solutions, @r"
    | ?g | ?y |
    | <http://example.com/g1> | <http://example.com/b> |
    | <http://example.com/g1> | <http://example.com/c> |
    ");
    Ok(())
}

#[test]
fn test_optional() -> Result<(), Box<dyn Error>> {
    let processor = people()?;
    let solutions = solutions(
        &processor,
        "SELECT ?x ?name WHERE {
            ?x a <http://example.com/Person>
            OPTIONAL { ?x <http://example.com/name> ?name }
        }",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?x | ?name |
    | <http://example.com/alice> | "Alice" |
    | <http://example.com/bob> |  |
    "#);
    Ok(())
}

#[test]
fn test_union_minus_and_values() -> Result<(), Box<dyn Error>> {
    let processor = chain()?;
    let union = solutions(
        &processor,
        "SELECT ?x WHERE {
            { ?x <http://example.com/p> <http://example.com/b> }
            UNION
            { ?x <http://example.com/p> <http://example.com/d> }
        }",
    )?;
    insta::assert_snapshot!(union, @r"
    | ?x |
    | <http://example.com/a> |
    | <http://example.com/c> |
    ");

    let processor = people()?;
    let minus = solutions(
        &processor,
        "SELECT ?x WHERE {
            ?x a <http://example.com/Person>
            MINUS { ?x <http://example.com/name> ?name }
        }",
    )?;
    insta::assert_snapshot!(minus, @r"
    | ?x |
    | <http://example.com/bob> |
    ");

    let values = solutions(
        &processor,
        "SELECT ?x ?name WHERE {
            VALUES ?x { <http://example.com/bob> <http://example.com/alice> }
            ?x <http://example.com/name> ?name
        }",
    )?;
    insta::assert_snapshot!(values, @r#"
    | ?x | ?name |
    | <http://example.com/alice> | "Alice" |
    "#);
    Ok(())
}

#[test]
fn test_distinct() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    let solutions = solutions(
        &processor,
        "SELECT DISTINCT ?x WHERE { ?x <http://example.com/p> ?y }",
    )?;
    insta::assert_snapshot!(solutions, @r"
    | ?x |
    | <http://example.com/a> |
    ");
    Ok(())
}

#[test]
fn test_group_by_having() -> Result<(), Box<dyn Error>> {
    let processor = sales()?;
    let solutions = solutions(
        &processor,
        "SELECT ?region (SUM(?amount) AS ?total) (COUNT(*) AS ?n) WHERE {
            ?sale <http://example.com/region> ?region ; <http://example.com/amount> ?amount
        }
        GROUP BY ?region
        HAVING (SUM(?amount) > 6)",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?region | ?total | ?n |
    | <http://example.com/north> | "30"^^<http://www.w3.org/2001/XMLSchema#integer> | "2"^^<http://www.w3.org/2001/XMLSchema#integer> |
    "#);
    Ok(())
}

#[test]
fn test_order_by_aggregate() -> Result<(), Box<dyn Error>> {
    let processor = sales()?;
    let solutions = solutions(
        &processor,
        "SELECT ?region (SUM(?amount) AS ?total) WHERE {
            ?sale <http://example.com/region> ?region ; <http://example.com/amount> ?amount
        }
        GROUP BY ?region
        ORDER BY ?total
        LIMIT 1",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?region | ?total |
    | <http://example.com/south> | "5"^^<http://www.w3.org/2001/XMLSchema#integer> |
    "#);
    Ok(())
}

#[test]
fn test_count_without_solutions() -> Result<(), Box<dyn Error>> {
    let processor = sales()?;
    let solutions = solutions(
        &processor,
        "SELECT (COUNT(*) AS ?n) WHERE { ?x <http://example.com/missing> ?y }",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?n |
    | "0"^^<http://www.w3.org/2001/XMLSchema#integer> |
    "#);
    Ok(())
}

#[test]
fn test_extension_function() -> Result<(), Box<dyn Error>> {
    let n = Variable::new_unchecked("n");
    let double = FunctionDefinition::new(
        NamedNode::new_unchecked("http://example.com/double"),
        vec![n.clone()],
        Expr::binary(
            BinaryOp::Multiply,
            Expr::variable(&n),
            Expr::constant(Literal::from(2)),
        ),
    );
    let registry = ExtensionRegistry::builder().define(double).build();
    let processor = edges(false)?.with_registry(Arc::new(registry));

    let solutions = solutions(
        &processor,
        "SELECT ?v WHERE { BIND(<http://example.com/double>(21) AS ?v) }",
    )?;
    insta::assert_snapshot!(solutions, @r#"
    | ?v |
    | "42"^^<http://www.w3.org/2001/XMLSchema#integer> |
    "#);
    Ok(())
}

#[test]
fn test_ask() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    assert!(ask(
        &processor,
        "ASK { <http://example.com/a> <http://example.com/p> <http://example.com/b> }"
    )?);
    assert!(!ask(
        &processor,
        "ASK { <http://example.com/a> <http://example.com/p> <http://example.com/z> }"
    )?);
    Ok(())
}

#[test]
fn test_unsupported_queries() -> Result<(), Box<dyn Error>> {
    let processor = edges(false)?;
    assert!(matches!(
        processor.query("CONSTRUCT { ?x ?p ?y } WHERE { ?x ?p ?y }"),
        Err(QueryError::NotImplemented(_))
    ));
    assert!(matches!(
        processor.query("SELECT ?x WHERE { ?x "),
        Err(QueryError::Syntax(_))
    ));
    Ok(())
}
