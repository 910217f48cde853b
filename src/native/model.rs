use super::expr::LinearExpr;
use crate::domain::value_objects::{ColumnKind, ObjectiveSense, RowSense};

/// Decision column of the native model
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        kind: ColumnKind,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            lower_bound,
            upper_bound,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.kind.is_integer()
    }
}

/// Linear row `expr sense rhs`; the expression carries no constant term
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: RowSense,
    pub rhs: f64,
}

impl Row {
    /// Builds `lhs sense rhs` with every constant moved to the right-hand side
    pub fn between(
        name: impl Into<String>,
        lhs: &LinearExpr,
        sense: RowSense,
        rhs: &LinearExpr,
    ) -> Self {
        let difference = lhs.sub(rhs);
        Self {
            name: name.into(),
            rhs: -difference.constant(),
            expr: difference.without_constant(),
            sense,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.expr.is_constant()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub expr: LinearExpr,
}

/// Complete native model: columns, rows and at most one objective
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeModel {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub objective: Option<Objective>,
}

impl NativeModel {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn num_integer_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Integer).count()
    }

    pub fn num_binary_columns(&self) -> usize {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Binary).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.columns.iter().any(Column::is_integer)
    }

    /// First row without columns whose constant comparison fails
    pub fn violated_constant_row(&self) -> Option<&Row> {
        self.rows
            .iter()
            .find(|row| row.is_constant() && !row.sense.holds(0.0, row.rhs, 1e-9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_moves_constants_to_rhs() {
        // x + 2 <= y + 5  ->  x - y <= 3
        let lhs = LinearExpr::from_terms([(0, 1.0)], 2.0);
        let rhs = LinearExpr::from_terms([(1, 1.0)], 5.0);
        let row = Row::between("c0", &lhs, RowSense::LessOrEqual, &rhs);
        assert_eq!(row.rhs, 3.0);
        assert_eq!(row.expr.coefficient(0), 1.0);
        assert_eq!(row.expr.coefficient(1), -1.0);
        assert_eq!(row.expr.constant(), 0.0);
    }

    #[test]
    fn constant_rows_are_checked() {
        let three = LinearExpr::constant_value(3.0);
        let five = LinearExpr::constant_value(5.0);
        let mut model = NativeModel::default();
        model.rows.push(Row::between("ok", &three, RowSense::LessOrEqual, &five));
        assert!(model.violated_constant_row().is_none());

        model.rows.push(Row::between("bad", &three, RowSense::GreaterOrEqual, &five));
        assert_eq!(model.violated_constant_row().unwrap().name, "bad");
    }
}
