//! Pearson chi-square test of independence on 2×2 contingency tables.
//!
//! A 2×2 table always has one degree of freedom, so Yates' continuity
//! correction is always applied. The p-value is the
//! upper tail of the chi-square distribution, computed through the
//! regularized upper incomplete gamma function.

use std::fmt;

use tracing::debug;

use crate::aggregation::CategoryPivot;
use crate::error::EdaError;

const DEGREES_OF_FREEDOM: u32 = 1;

/// Category × protection-status counts. Rows are categories, columns are
/// `[protected, not_protected]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContingencyTable {
    cells: [[u64; 2]; 2],
}

impl ContingencyTable {
    pub fn new(cells: [[u64; 2]; 2]) -> Self {
        Self { cells }
    }

    /// Build the table for two categories from the protection pivot.
    pub fn from_pivot(pivot: &CategoryPivot, first: &str, second: &str) -> Result<Self, EdaError> {
        let row = |category: &str| -> Result<[u64; 2], EdaError> {
            let r = pivot
                .get(category)
                .ok_or_else(|| EdaError::MissingCategory(category.to_string()))?;
            Ok([r.protected_count(), r.not_protected_count()])
        };
        Ok(Self::new([row(first)?, row(second)?]))
    }

    pub fn cells(&self) -> [[u64; 2]; 2] {
        self.cells
    }

    fn row_totals(&self) -> [u64; 2] {
        [
            self.cells[0][0] + self.cells[0][1],
            self.cells[1][0] + self.cells[1][1],
        ]
    }

    fn column_totals(&self) -> [u64; 2] {
        [
            self.cells[0][0] + self.cells[1][0],
            self.cells[0][1] + self.cells[1][1],
        ]
    }

    pub fn total(&self) -> u64 {
        self.row_totals().iter().sum()
    }

    /// Expected frequencies under independence: row_total * col_total / n.
    pub fn expected(&self) -> [[f64; 2]; 2] {
        let rows = self.row_totals();
        let cols = self.column_totals();
        let n = self.total() as f64;
        let mut expected = [[0.0; 2]; 2];
        for (i, row) in expected.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = rows[i] as f64 * cols[j] as f64 / n;
            }
        }
        expected
    }

    /// (rows - 1) * (columns - 1), which is 1 for every 2×2 table.
    pub fn degrees_of_freedom(&self) -> u32 {
        DEGREES_OF_FREEDOM
    }
}

impl fmt::Display for ContingencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{}, {}], [{}, {}]]",
            self.cells[0][0], self.cells[0][1], self.cells[1][0], self.cells[1][1]
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: u32,
    pub expected: [[f64; 2]; 2],
}

impl ChiSquareResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Chi-square test of independence with Yates' continuity correction.
///
/// Tables with an empty row or column produce a NaN statistic and p-value.
pub fn chi2_contingency(table: &ContingencyTable) -> ChiSquareResult {
    let expected = table.expected();
    let dof = table.degrees_of_freedom();
    let cells = table.cells();

    let mut statistic = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let e = expected[i][j];
            let mut o = cells[i][j] as f64;
            let diff = e - o;
            if diff != 0.0 {
                o += diff.abs().min(0.5).copysign(diff);
            }
            statistic += (o - e).powi(2) / e;
        }
    }

    let p_value = chi_square_sf(statistic, dof as f64);
    debug!(%table, statistic, p_value, dof, "chi-square test");

    ChiSquareResult {
        statistic,
        p_value,
        dof,
        expected,
    }
}

// ── Distribution helpers ────────────────────────────────────────────────────

/// Survival function of the chi-square distribution: P(X > x).
pub fn chi_square_sf(x: f64, dof: f64) -> f64 {
    if x.is_nan() || dof <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    upper_gamma_regularized(dof / 2.0, x / 2.0)
}

/// Q(a, x) = Γ(a, x) / Γ(a).
fn upper_gamma_regularized(a: f64, x: f64) -> f64 {
    if x < a + 1.0 {
        1.0 - lower_gamma_series(a, x)
    } else {
        upper_gamma_cf(a, x)
    }
}

/// P(a, x) by its power series; converges quickly for x < a + 1.
fn lower_gamma_series(a: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 500;
    const EPSILON: f64 = 1e-15;

    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPSILON {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Q(a, x) by Lentz's continued fraction; used for x >= a + 1.
fn upper_gamma_cf(a: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 500;
    const EPSILON: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPSILON {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// ln Γ(x) for x > 0 via the Lanczos approximation (g = 7, n = 9).
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x < 0.5 {
        // Reflection: Γ(x)Γ(1-x) = π / sin(πx)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = COEF[0];
    for (i, c) in COEF.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::CategoryPivot;
    use crate::model::BiodiversityModel;
    use crate::schema::species;
    use polars::prelude::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mammal_vs_bird_not_significant() {
        let result = chi2_contingency(&ContingencyTable::new([[30, 146], [75, 413]]));
        assert_close(result.statistic, 0.161_701_483_165_455_7, 1e-9);
        assert_close(result.p_value, 0.687_594_809_666_133_7, 1e-6);
        assert_eq!(result.dof, 1);
        assert!(result.p_value >= 0.05);
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn test_mammal_vs_reptile_significant() {
        let result = chi2_contingency(&ContingencyTable::new([[30, 146], [5, 73]]));
        assert_close(result.statistic, 4.289_183_096_203_645, 1e-9);
        assert_close(result.p_value, 0.038_355_590_229_698_99, 1e-6);
        assert!(result.is_significant(0.05));
    }

    #[test]
    fn test_expected_frequencies() {
        let table = ContingencyTable::new([[30, 146], [75, 413]]);
        let expected = table.expected();
        assert_close(expected[0][0], 27.831_325_301_204_82, 1e-9);
        assert_close(expected[0][1], 148.168_674_698_795_17, 1e-9);
        assert_close(expected[1][0], 77.168_674_698_795_19, 1e-9);
        assert_close(expected[1][1], 410.831_325_301_204_8, 1e-9);
        let sum: f64 = expected.iter().flatten().sum();
        assert_close(sum, table.total() as f64, 1e-9);
    }

    #[test]
    fn test_independent_table_has_unit_p_value() {
        let result = chi2_contingency(&ContingencyTable::new([[10, 20], [10, 20]]));
        assert_close(result.statistic, 0.0, 1e-12);
        assert_close(result.p_value, 1.0, 1e-12);
    }

    #[test]
    fn test_yates_correction_shrinks_every_cell() {
        // Expected is 1 everywhere; uncorrected chi2 would be 4.0
        let table = ContingencyTable::new([[2, 0], [0, 2]]);
        assert_eq!(table.degrees_of_freedom(), 1);
        let result = chi2_contingency(&table);
        assert_close(result.statistic, 1.0, 1e-12);
        assert_close(result.p_value, chi_square_sf(1.0, 1.0), 1e-12);
    }

    #[test]
    fn test_chi_square_sf_reference_points() {
        // 95th percentile with one degree of freedom
        assert_close(chi_square_sf(3.841_458_820_694_124, 1.0), 0.05, 1e-9);
        // Two degrees of freedom is exponential: exp(-x/2)
        assert_close(chi_square_sf(4.0, 2.0), (-2.0f64).exp(), 1e-12);
        assert_close(chi_square_sf(0.5, 2.0), (-0.25f64).exp(), 1e-12);
        assert_eq!(chi_square_sf(0.0, 1.0), 1.0);
    }

    #[test]
    fn test_ln_gamma_integers() {
        assert_close(ln_gamma(1.0), 0.0, 1e-12);
        assert_close(ln_gamma(5.0), 24.0f64.ln(), 1e-12);
        assert_close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-12);
    }

    #[test]
    fn test_table_from_pivot() {
        let raw = df!(
            species::SCIENTIFIC_NAME => &["a", "b", "c", "d", "e"],
            species::COMMON_NAMES => &["A", "B", "C", "D", "E"],
            species::CATEGORY => &["Mammal", "Mammal", "Mammal", "Bird", "Bird"],
            species::CONSERVATION_STATUS => &[Some("Endangered"), None, None, Some("Threatened"), None],
        )
        .unwrap();
        let pivot =
            CategoryPivot::from_species(&BiodiversityModel::clean_species(raw).unwrap()).unwrap();

        let table = ContingencyTable::from_pivot(&pivot, "Mammal", "Bird").unwrap();
        assert_eq!(table.cells(), [[1, 2], [1, 1]]);

        assert!(matches!(
            ContingencyTable::from_pivot(&pivot, "Mammal", "Reptile"),
            Err(EdaError::MissingCategory(c)) if c == "Reptile"
        ));
    }
}
