pub mod aggregator;
pub mod builtins;
pub mod definition;
pub mod error;
pub mod registry;
pub mod value;

pub use aggregator::{InputRow, OrderedGroupedAggregator, ResultRow};
pub use definition::{AggregateDef, FinalizeFn, InitFn, StepFn};
pub use error::{AggregateError, StepError};
pub use registry::Registry;
pub use value::Value;

#[cfg(test)]
mod tests {
    use fastrand::Rng;
    use itertools::Itertools;

    use super::*;

    fn run(registry: &Registry, name: &str, rows: &[InputRow]) -> Vec<(Value, Value)> {
        OrderedGroupedAggregator::new(registry)
            .run(name, rows)
            .unwrap()
            .into_iter()
            .map(|r| (r.group, r.value))
            .collect_vec()
    }

    #[test]
    fn sum_partitions_by_group() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 1, 5),
            InputRow::new("B", 1, 3),
            InputRow::new("A", 2, 7),
        ];

        let out = run(&registry, "sum", &rows);
        assert_eq!(
            out,
            vec![
                (Value::from("A"), Value::Int(12)),
                (Value::from("B"), Value::Int(3)),
            ]
        );
    }

    #[test]
    fn collect_folds_in_sort_key_order() {
        let registry = Registry::with_builtins();
        let rows = vec![InputRow::new("A", 2, "y"), InputRow::new("A", 1, "x")];

        let out = run(&registry, "collect", &rows);
        assert_eq!(
            out,
            vec![(
                Value::from("A"),
                Value::List(vec![Value::from("x"), Value::from("y")]),
            )]
        );
    }

    #[test]
    fn unknown_aggregate_is_rejected() {
        let registry = Registry::with_builtins();
        let rows = vec![InputRow::new("A", 1, 5)];

        let err = OrderedGroupedAggregator::new(&registry)
            .run("missing", &rows)
            .unwrap_err();
        assert_eq!(err, AggregateError::UnknownAggregate("missing".into()));
    }

    #[test]
    fn duplicate_registration_keeps_the_first() {
        let mut registry = Registry::new();
        registry.register(builtins::sum()).unwrap();

        let err = registry.register(builtins::sum()).unwrap_err();
        assert_eq!(err, AggregateError::DuplicateName("sum".into()));

        // the original registration still runs
        let rows = vec![InputRow::new("A", 1, 2), InputRow::new("A", 2, 3)];
        let out = run(&registry, "sum", &rows);
        assert_eq!(out, vec![(Value::from("A"), Value::Int(5))]);
    }

    #[test]
    fn groups_are_an_exact_partition() {
        let registry = Registry::with_builtins();
        let mut rng = Rng::with_seed(7);
        let rows = (0..1_000)
            .map(|i| InputRow::new(rng.i64(0..37), i, 1))
            .collect_vec();

        let out = run(&registry, "count", &rows);
        let distinct = rows.iter().map(|r| r.group.clone()).sorted().dedup().count();
        assert_eq!(out.len(), distinct);
        let total: i64 = out
            .iter()
            .map(|(_g, v)| match v {
                Value::Int(n) => *n,
                other => panic!("count produced {other}"),
            })
            .sum();
        assert_eq!(total, rows.len() as i64);
    }

    #[test]
    fn groups_come_out_in_first_seen_order() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("C", 1, 1),
            InputRow::new("A", 1, 1),
            InputRow::new("C", 2, 1),
            InputRow::new("B", 1, 1),
        ];

        let out = run(&registry, "count", &rows);
        let groups = out.into_iter().map(|(g, _v)| g).collect_vec();
        assert_eq!(
            groups,
            vec![Value::from("C"), Value::from("A"), Value::from("B")]
        );
    }

    #[test]
    fn equal_sort_keys_keep_arrival_order() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 1, "first"),
            InputRow::new("A", 0, "zeroth"),
            InputRow::new("A", 1, "second"),
            InputRow::new("A", 1, "third"),
        ];

        let out = run(&registry, "collect", &rows);
        assert_eq!(
            out,
            vec![(
                Value::from("A"),
                Value::List(vec![
                    Value::from("zeroth"),
                    Value::from("first"),
                    Value::from("second"),
                    Value::from("third"),
                ]),
            )]
        );
    }

    #[test]
    fn unique_sort_keys_make_arrival_order_irrelevant() {
        let registry = Registry::with_builtins();
        let mut rows = (0..200)
            .map(|i| InputRow::new(i % 5, i, i))
            .collect_vec();

        let expected = run(&registry, "collect", &rows);
        let mut rng = Rng::with_seed(11);
        for _ in 0..10 {
            rng.shuffle(&mut rows);
            let shuffled = run(&registry, "collect", &rows);
            let resorted = shuffled
                .into_iter()
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .collect_vec();
            let expected_sorted = expected
                .iter()
                .cloned()
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .collect_vec();
            assert_eq!(resorted, expected_sorted);
        }
    }

    #[test]
    fn run_is_idempotent() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 3, 1),
            InputRow::new("B", 1, 2),
            InputRow::new("A", 1, 3),
        ];

        assert_eq!(run(&registry, "sum", &rows), run(&registry, "sum", &rows));
    }

    #[test]
    fn computation_error_names_the_group() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 1, 5),
            InputRow::new("B", 1, "not a number"),
        ];

        let err = OrderedGroupedAggregator::new(&registry)
            .run("sum", &rows)
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::Computation {
                name: "sum".into(),
                group: Value::from("B"),
                source: StepError::TypeMismatch {
                    expected: "int or float",
                    actual: "str",
                },
            }
        );
    }

    #[test]
    fn sum_promotes_to_float() {
        let registry = Registry::with_builtins();
        let rows = vec![InputRow::new("A", 1, 2), InputRow::new("A", 2, 0.5)];

        let out = run(&registry, "sum", &rows);
        assert_eq!(out, vec![(Value::from("A"), Value::Float(2.5))]);
    }

    #[test]
    fn sum_overflow_is_reported() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 1, i64::MAX),
            InputRow::new("A", 2, 1),
        ];

        let err = OrderedGroupedAggregator::new(&registry)
            .run("sum", &rows)
            .unwrap_err();
        assert!(matches!(
            err,
            AggregateError::Computation {
                source: StepError::Overflow,
                ..
            }
        ));
    }

    #[test]
    fn min_and_max() {
        let registry = Registry::with_builtins();
        let rows = vec![
            InputRow::new("A", 1, 4),
            InputRow::new("A", 2, -2),
            InputRow::new("A", 3, 9),
            InputRow::new("B", 1, 7),
        ];

        assert_eq!(
            run(&registry, "min", &rows),
            vec![
                (Value::from("A"), Value::Int(-2)),
                (Value::from("B"), Value::Int(7)),
            ]
        );
        assert_eq!(
            run(&registry, "max", &rows),
            vec![
                (Value::from("A"), Value::Int(9)),
                (Value::from("B"), Value::Int(7)),
            ]
        );
    }

    #[test]
    fn linear_fit_recovers_a_line() {
        let registry = Registry::with_builtins();
        // y = 2x + 1, fed out of order
        let rows = [3.0, 0.0, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, x)| {
                InputRow::new(
                    "series",
                    i as i64,
                    Value::List(vec![Value::Float(*x), Value::Float(2.0 * x + 1.0)]),
                )
            })
            .collect_vec();

        let out = run(&registry, "linear_fit", &rows);
        let (group, fit) = &out[0];
        assert_eq!(group, &Value::from("series"));
        let Value::List(fit) = fit else {
            panic!("linear_fit produced {fit}")
        };
        let (Value::Float(slope), Value::Float(intercept)) = (&fit[0], &fit[1]) else {
            panic!("non-numeric fit")
        };
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_needs_two_distinct_x() {
        let registry = Registry::with_builtins();
        let rows = vec![InputRow::new(
            "series",
            1,
            Value::List(vec![Value::Float(1.0), Value::Float(5.0)]),
        )];

        let err = OrderedGroupedAggregator::new(&registry)
            .run("linear_fit", &rows)
            .unwrap_err();
        assert!(matches!(
            err,
            AggregateError::Computation {
                source: StepError::DegenerateFit,
                ..
            }
        ));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        let registry = Registry::with_builtins();
        assert_eq!(run(&registry, "sum", &[]), vec![]);
    }

    #[test]
    fn custom_aggregates_register_alongside_builtins() {
        let mut registry = Registry::with_builtins();
        registry
            .register(AggregateDef::new(
                "last",
                || Value::List(Vec::new()),
                |_state, value| Ok(Value::List(vec![value.clone()])),
                |state| match state {
                    Value::List(mut held) => held.pop().ok_or(StepError::Empty),
                    other => Err(StepError::TypeMismatch {
                        expected: "list state",
                        actual: other.kind(),
                    }),
                },
            ))
            .unwrap();

        let rows = vec![
            InputRow::new("A", 2, "later"),
            InputRow::new("A", 1, "earlier"),
        ];
        assert_eq!(
            run(&registry, "last", &rows),
            vec![(Value::from("A"), Value::from("later"))]
        );
    }
}
