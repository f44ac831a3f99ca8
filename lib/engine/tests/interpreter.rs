use kgram_common::GraphIndex;
use kgram_engine::{
    Bindings, Environment, EvaluationOptions, ExistsListener, Interpreter, JoinSubEvaluator,
    Mapping, MappingEnvironment, Memory, Producer, QueryError,
};
use kgram_functions::{ExtensionRegistry, SparqlValueProxy};
use kgram_logical::{
    Aggregate, AggregateFunction, BinaryOp, EdgePattern, Expr, Function, FunctionDefinition,
    GraphPattern, PatternId, Query,
};
use kgram_model::vocab::kg;
use kgram_model::{Literal, NamedNode, Node, Term, Variable};
use kgram_storage::MemGraph;
use std::sync::{Arc, Mutex};

fn iri(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.com/{name}")).into()
}

fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

fn int(value: i64) -> Term {
    Literal::from(value).into()
}

fn boolean(value: bool) -> Expr {
    Expr::constant(Literal::from(value))
}

fn producer() -> Producer {
    let mut graph = MemGraph::new();
    graph.insert(iri("a"), iri("p"), iri("b"), None).unwrap();
    let graph: Arc<dyn GraphIndex> = Arc::new(graph);
    Producer::new(graph, EvaluationOptions::default())
}

fn interpreter() -> Interpreter {
    Interpreter::new(
        Arc::new(SparqlValueProxy),
        Arc::new(ExtensionRegistry::default()),
    )
}

fn body() -> GraphPattern {
    GraphPattern::Edge(EdgePattern::new(var("x"), iri("p"), var("y")))
}

fn query() -> Query {
    Query::builder(body()).build()
}

fn double() -> FunctionDefinition {
    let n = var("n");
    FunctionDefinition::new(
        NamedNode::new_unchecked("http://example.com/double"),
        vec![n.clone()],
        Expr::binary(BinaryOp::Multiply, Expr::variable(&n), Expr::constant(int(2))),
    )
}

fn call_double(arg: i64) -> Expr {
    Expr::call(
        Function::Extension(NamedNode::new_unchecked("http://example.com/double")),
        vec![Expr::constant(int(arg))],
    )
}

#[test]
fn conjunction_follows_three_valued_logic() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = interpreter();
    let error = Expr::variable(&var("x"));

    let false_and = Expr::And(vec![boolean(false), error.clone()]);
    assert_eq!(
        interpreter.evaluate(&false_and, &mut memory, &producer).unwrap(),
        Some(Literal::from(false).into())
    );
    let and_false = Expr::And(vec![error.clone(), boolean(false)]);
    assert_eq!(
        interpreter.evaluate(&and_false, &mut memory, &producer).unwrap(),
        None
    );
    let and_true = Expr::And(vec![error.clone(), boolean(true)]);
    assert_eq!(
        interpreter.evaluate(&and_true, &mut memory, &producer).unwrap(),
        None
    );
    assert!(!interpreter.test(&and_true, &mut memory, &producer).unwrap());
}

#[test]
fn conjunction_stops_at_the_first_operand_without_value() {
    let query = query();
    let mut memory = Memory::new(&query);
    let interpreter = interpreter().with_sub_evaluator(JoinSubEvaluator::new_ref());

    let expr = Expr::And(vec![
        Expr::variable(&var("x")),
        Expr::Exists(PatternId::new(7)),
    ]);
    assert_eq!(
        interpreter.evaluate(&expr, &mut memory, &producer()).unwrap(),
        None
    );
}

#[test]
fn disjunction_follows_three_valued_logic() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = interpreter();
    let error = Expr::variable(&var("x"));

    let or_true = Expr::Or(vec![error.clone(), boolean(true)]);
    assert!(interpreter.test(&or_true, &mut memory, &producer).unwrap());
    let or_false = Expr::Or(vec![error.clone(), boolean(false)]);
    assert_eq!(
        interpreter.evaluate(&or_false, &mut memory, &producer).unwrap(),
        None
    );
    assert_eq!(
        interpreter
            .evaluate(&Expr::negation(error), &mut memory, &producer)
            .unwrap(),
        None
    );
}

#[test]
fn bound_tests_the_memory() {
    let query = query();
    let mut memory = Memory::new(&query);
    memory.bind(&var("x"), &Node::external(iri("a"))).unwrap();
    let producer = producer();
    let interpreter = interpreter();

    assert!(interpreter
        .test(&Expr::Bound(var("x")), &mut memory, &producer)
        .unwrap());
    assert!(!interpreter
        .test(&Expr::Bound(var("y")), &mut memory, &producer)
        .unwrap());
}

#[test]
fn in_without_match_and_with_error_has_no_value() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = interpreter();
    let one = Box::new(Expr::constant(int(1)));
    let error = Expr::variable(&var("x"));

    let found = Expr::In(one.clone(), vec![error.clone(), Expr::constant(int(1))]);
    assert!(interpreter.test(&found, &mut memory, &producer).unwrap());
    let missing = Expr::In(one.clone(), vec![error, Expr::constant(int(2))]);
    assert_eq!(
        interpreter.evaluate(&missing, &mut memory, &producer).unwrap(),
        None
    );
    let not_found = Expr::In(one, vec![Expr::constant(int(2))]);
    assert_eq!(
        interpreter.evaluate(&not_found, &mut memory, &producer).unwrap(),
        Some(Literal::from(false).into())
    );
}

#[test]
fn let_shadows_and_restores_bindings() {
    let query = query();
    let mut memory = Memory::new(&query);
    memory.bind(&var("x"), &Node::external(int(5))).unwrap();
    let producer = producer();
    let interpreter = interpreter();

    let shadowed = Expr::Let(
        var("x"),
        Box::new(Expr::constant(int(1))),
        Box::new(Expr::binary(
            BinaryOp::Add,
            Expr::variable(&var("x")),
            Expr::constant(int(1)),
        )),
    );
    assert_eq!(
        interpreter.evaluate(&shadowed, &mut memory, &producer).unwrap(),
        Some(int(2))
    );
    assert!(memory.locals().is_empty());
    assert_eq!(
        interpreter
            .evaluate(&Expr::variable(&var("x")), &mut memory, &producer)
            .unwrap(),
        Some(int(5))
    );
}

#[test]
fn failing_let_body_restores_bindings() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = interpreter().with_sub_evaluator(JoinSubEvaluator::new_ref());

    let expr = Expr::Let(
        var("z"),
        Box::new(Expr::constant(int(1))),
        Box::new(Expr::Exists(PatternId::new(7))),
    );
    let result = interpreter.evaluate(&expr, &mut memory, &producer);
    assert!(matches!(result, Err(QueryError::UndeclaredPattern(_))));
    assert!(memory.locals().is_empty());
    assert_eq!(memory.get(&var("z")), None);
}

#[test]
fn failing_function_body_unsets_its_parameters() {
    let n = var("n");
    let broken = FunctionDefinition::new(
        NamedNode::new_unchecked("http://example.com/double"),
        vec![n.clone()],
        Expr::And(vec![Expr::Bound(n), Expr::Exists(PatternId::new(7))]),
    );
    let query = Query::builder(body()).define_function(broken).build();
    let mut memory = Memory::new(&query);
    let interpreter = interpreter().with_sub_evaluator(JoinSubEvaluator::new_ref());

    let result = interpreter.evaluate(&call_double(21), &mut memory, &producer());
    assert!(matches!(result, Err(QueryError::UndeclaredPattern(_))));
    assert!(memory.locals().is_empty());
    assert_eq!(memory.get(&var("n")), None);
}

#[test]
fn stack_introspection_sees_local_bindings() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = interpreter();

    let expr = Expr::Let(
        var("z"),
        Box::new(Expr::constant(int(1))),
        Box::new(Expr::System(Some(kg::STACK.into()))),
    );
    let stack = interpreter
        .evaluate(&expr, &mut memory, &producer)
        .unwrap()
        .unwrap();
    let bindings = stack.as_object().unwrap().downcast_ref::<Bindings>().unwrap();
    assert_eq!(bindings.0, vec![(var("z"), Node::external(int(1)))]);
}

#[test]
fn memory_introspection_sees_query_bindings() {
    let query = query();
    let mut memory = Memory::new(&query);
    memory.bind(&var("y"), &Node::external(iri("b"))).unwrap();
    let producer = producer();
    let interpreter = interpreter();

    let value = interpreter
        .evaluate(&Expr::System(None), &mut memory, &producer)
        .unwrap()
        .unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.label(), "memory");
    assert_eq!(
        object.downcast_ref::<Bindings>().unwrap().0,
        vec![(var("y"), Node::external(iri("b")))]
    );
}

#[test]
fn extension_functions_resolve_from_the_registry() {
    let query = query();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = Interpreter::new(
        Arc::new(SparqlValueProxy),
        Arc::new(ExtensionRegistry::builder().define(double()).build()),
    );

    assert_eq!(
        interpreter
            .evaluate(&call_double(21), &mut memory, &producer)
            .unwrap(),
        Some(int(42))
    );
    assert!(memory.locals().is_empty());

    let wrong_arity = Expr::call(
        Function::Extension(NamedNode::new_unchecked("http://example.com/double")),
        Vec::new(),
    );
    assert_eq!(
        interpreter
            .evaluate(&wrong_arity, &mut memory, &producer)
            .unwrap(),
        None
    );
}

#[test]
fn query_functions_shadow_the_registry() {
    let n = var("n");
    let triple = FunctionDefinition::new(
        NamedNode::new_unchecked("http://example.com/double"),
        vec![n.clone()],
        Expr::binary(BinaryOp::Multiply, Expr::variable(&n), Expr::constant(int(3))),
    );
    let query = Query::builder(body()).define_function(triple).build();
    let mut memory = Memory::new(&query);
    let producer = producer();
    let interpreter = Interpreter::new(
        Arc::new(SparqlValueProxy),
        Arc::new(ExtensionRegistry::builder().define(double()).build()),
    );

    assert_eq!(
        interpreter
            .evaluate(&call_double(21), &mut memory, &producer)
            .unwrap(),
        Some(int(63))
    );
}

#[test]
fn unknown_functions_have_no_value() {
    let query = query();
    let mut memory = Memory::new(&query);

    assert_eq!(
        interpreter()
            .evaluate(&call_double(1), &mut memory, &producer())
            .unwrap(),
        None
    );
}

#[test]
fn exists_without_sub_evaluator_fails() {
    let mut builder = Query::builder(body());
    let id = builder.register_pattern(body());
    let query = builder.build();
    let mut memory = Memory::new(&query);

    let result = interpreter().evaluate(&Expr::Exists(id), &mut memory, &producer());
    assert!(matches!(result, Err(QueryError::MissingSubEvaluator)));
}

#[test]
fn exists_with_undeclared_pattern_fails() {
    let query = query();
    let mut memory = Memory::new(&query);
    let interpreter = interpreter().with_sub_evaluator(JoinSubEvaluator::new_ref());

    let result = interpreter.evaluate(&Expr::Exists(PatternId::new(3)), &mut memory, &producer());
    assert!(matches!(
        result,
        Err(QueryError::UndeclaredPattern(id)) if id == PatternId::new(3)
    ));
}

#[derive(Debug, Default)]
struct RecordingListener(Mutex<Vec<(PatternId, bool)>>);

impl ExistsListener for RecordingListener {
    fn exists(&self, pattern: PatternId, exists: bool) {
        self.0.lock().unwrap().push((pattern, exists));
    }
}

#[test]
fn exists_sees_the_bindings_of_the_solution() {
    let mut builder = Query::builder(GraphPattern::empty());
    let id = builder.register_pattern(GraphPattern::Edge(EdgePattern::new(
        var("x"),
        iri("p"),
        var("z"),
    )));
    let query = builder.build();
    let producer = producer();
    let listener = Arc::new(RecordingListener::default());
    let shared: Arc<dyn ExistsListener> = Arc::<RecordingListener>::clone(&listener);
    let interpreter = interpreter()
        .with_sub_evaluator(JoinSubEvaluator::new_ref())
        .with_listener(shared);

    let mut memory = Memory::new(&query);
    memory.bind(&var("x"), &producer.node(&iri("a"))).unwrap();
    assert!(interpreter
        .test(&Expr::Exists(id), &mut memory, &producer)
        .unwrap());

    let mut memory = Memory::new(&query);
    memory.bind(&var("x"), &producer.node(&iri("z"))).unwrap();
    assert!(!interpreter
        .test(&Expr::Exists(id), &mut memory, &producer)
        .unwrap());
    assert_eq!(memory.binding(&var("z")), None);

    assert_eq!(*listener.0.lock().unwrap(), vec![(id, true), (id, false)]);
}

#[test]
fn aggregates_need_a_group() {
    let query = query();
    let mut memory = Memory::new(&query);
    let count = Expr::Aggregate(Aggregate {
        function: AggregateFunction::Count,
        argument: None,
        distinct: false,
    });

    assert_eq!(
        interpreter()
            .evaluate(&count, &mut memory, &producer())
            .unwrap(),
        None
    );
}

#[test]
fn aggregates_skip_unbound_values() {
    let query = query();
    let producer = producer();
    let interpreter = interpreter();
    let row = |y: Option<i64>| Mapping::new(vec![None, y.map(|y| Node::external(int(y)))]);
    let group = vec![row(Some(1)), row(Some(2)), row(None), row(Some(2))];
    let representative = group[0].clone();
    let mut env = MappingEnvironment::grouped(&query, &representative, &group);

    let aggregate = |function, argument: Option<Expr>, distinct| {
        Expr::Aggregate(Aggregate {
            function,
            argument: argument.map(Box::new),
            distinct,
        })
    };
    let y = || Some(Expr::variable(&var("y")));
    let mut evaluate = |expr: &Expr| interpreter.evaluate(expr, &mut env, &producer).unwrap();

    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Count, None, false)),
        Some(int(4))
    );
    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Count, None, true)),
        Some(int(3))
    );
    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Count, y(), false)),
        Some(int(3))
    );
    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Count, y(), true)),
        Some(int(2))
    );
    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Sum, y(), false)),
        Some(int(5))
    );
    assert_eq!(
        evaluate(&aggregate(AggregateFunction::Max, y(), false)),
        Some(int(2))
    );
}
