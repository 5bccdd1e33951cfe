use crate::model::RouteOp;

/// Anything with a total order compares through the same operator table.
pub trait OrderedCompare: PartialOrd + PartialEq {}

impl OrderedCompare for i64 {}
impl OrderedCompare for f64 {}
impl OrderedCompare for &str {}
impl OrderedCompare for chrono::NaiveDateTime {}

pub fn compare_ordered<T: OrderedCompare>(left: T, op: RouteOp, right: T) -> bool {
    match op {
        RouteOp::Eq => left == right,
        RouteOp::Ne => left != right,
        RouteOp::Gt => left > right,
        RouteOp::Ge => left >= right,
        RouteOp::Lt => left < right,
        RouteOp::Le => left <= right,
    }
}
