use std::collections::BTreeMap;

use thiserror::Error;

use crate::parse::{BinOp, CompareOp, Expr, MonoOp, Span, Statement};
use crate::uncertain::Uncertain;

/// Variable bindings for one evaluation: name to value.
pub type Context<'a> = BTreeMap<&'a str, Uncertain>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("missing variable `{name}`")]
    MissingVariable { name: String, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::MissingVariable { span, .. } => *span,
        }
    }
}

/// The result of checking a statement against one binding: a scalar cost
/// (lower is better) and labeled values for display.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub cost: f64,
    pub info: Vec<(&'static str, Uncertain)>,
}

impl Expr<'_> {
    pub fn eval(&self, ctx: &Context<'_>) -> Result<Uncertain, EvalError> {
        Ok(match self {
            Expr::Number { value, .. } => value.clone(),
            Expr::Variable { name, span } => {
                ctx.get(*name)
                    .cloned()
                    .ok_or_else(|| EvalError::MissingVariable {
                        name: (*name).to_string(),
                        span: *span,
                    })?
            }
            Expr::Negate { inner, .. } => -inner.eval(ctx)?,
            Expr::Binary { op, lhs, rhs, .. } => {
                let lhs = lhs.eval(ctx)?;
                let rhs = rhs.eval(ctx)?;
                match op {
                    BinOp::Add => lhs + rhs,
                    BinOp::Sub => lhs - rhs,
                    BinOp::Mul => lhs * rhs,
                    BinOp::Div => lhs / rhs,
                }
            }
        })
    }
}

impl Statement<'_> {
    pub fn check(&self, ctx: &Context<'_>) -> Result<Outcome, EvalError> {
        match self {
            Statement::Mono { op, expr, .. } => {
                let value = expr.eval(ctx)?;
                let cost = match op {
                    MonoOp::Min => value.value(),
                    MonoOp::Max => -value.value(),
                    MonoOp::MinAbs => value.second_moment(),
                    MonoOp::MaxAbs => (Uncertain::exact(1.0) / value.clone()).second_moment(),
                };
                Ok(Outcome {
                    cost,
                    info: vec![("Value", value)],
                })
            }
            // a bare expression is searched like `minabs`
            Statement::Bare(expr) => {
                let value = expr.eval(ctx)?;
                Ok(Outcome {
                    cost: value.second_moment(),
                    info: vec![("Value", value)],
                })
            }
            Statement::Compare { op, lhs, rhs, .. } => {
                let lhs = lhs.eval(ctx)?;
                let rhs = rhs.eval(ctx)?;
                let difference = lhs.clone() - rhs.clone();
                let cost = match op {
                    CompareOp::Eq => difference.second_moment(),
                    CompareOp::Less => difference.value(),
                    CompareOp::Greater => -difference.value(),
                };
                Ok(Outcome {
                    cost,
                    info: vec![("LHS", lhs), ("RHS", rhs)],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_expr, parse_statement};
    use crate::uncertain::Source;
    use float_cmp::assert_approx_eq;

    fn ctx(bindings: &[(&'static str, f64, f64)]) -> Context<'static> {
        bindings
            .iter()
            .map(|&(name, v, tol)| (name, Uncertain::with_static(v, tol)))
            .collect()
    }

    #[test]
    fn expression_evaluation_propagates_uncertainty() {
        let expr = parse_expr("a * b").unwrap();
        let ctx = ctx(&[("a", 10.0, 1.0), ("b", 5.0, 0.5)]);
        let value = expr.eval(&ctx).unwrap();
        assert_approx_eq!(f64, value.value(), 50.0);
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 10.0);
    }

    #[test]
    fn missing_variable_carries_its_span() {
        let expr = parse_expr("a + missing").unwrap();
        let err = expr.eval(&ctx(&[("a", 1.0, 0.0)])).unwrap_err();
        let EvalError::MissingVariable { name, span } = err;
        assert_eq!(name, "missing");
        assert_eq!(span.start, 4);
        assert_eq!(span.end, 11);
    }

    #[test]
    fn min_and_max_costs_are_signed_values() {
        let bindings = ctx(&[("x", 3.0, 0.0)]);
        let min = parse_statement("min x").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, min.cost, 3.0);
        let max = parse_statement("max x").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, max.cost, -3.0);
    }

    #[test]
    fn minabs_costs_the_second_moment() {
        let bindings = ctx(&[("x", 2.0, 3.0)]);
        let outcome = parse_statement("minabs x").unwrap().check(&bindings).unwrap();
        // v^2 + r^2/3
        assert_approx_eq!(f64, outcome.cost, 7.0);
    }

    #[test]
    fn maxabs_costs_the_reciprocal_second_moment() {
        let bindings = ctx(&[("x", 2.0, 0.0)]);
        let outcome = parse_statement("maxabs x").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, outcome.cost, 0.25);
    }

    #[test]
    fn bare_expression_checks_like_minabs() {
        let bindings = ctx(&[("x", 2.0, 3.0)]);
        let bare = parse_statement("x").unwrap().check(&bindings).unwrap();
        let minabs = parse_statement("minabs x").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, bare.cost, minabs.cost);
    }

    #[test]
    fn equality_costs_the_difference_second_moment() {
        let bindings = ctx(&[("a", 5.0, 1.0), ("b", 3.0, 0.5)]);
        let outcome = parse_statement("a = b").unwrap().check(&bindings).unwrap();
        // difference is 2 with static 1.5, so 4 + 1.5^2/3
        assert_approx_eq!(f64, outcome.cost, 4.75);
        assert_eq!(outcome.info[0].0, "LHS");
        assert_eq!(outcome.info[1].0, "RHS");
    }

    #[test]
    fn orderings_cost_the_signed_difference() {
        let bindings = ctx(&[("a", 5.0, 0.0), ("b", 3.0, 0.0)]);
        let less = parse_statement("a < b").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, less.cost, 2.0);
        let greater = parse_statement("a > b").unwrap().check(&bindings).unwrap();
        assert_approx_eq!(f64, greater.cost, -2.0);
    }
}
