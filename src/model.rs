use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::StudentTable;
use crate::error::{AppError, Result};
use crate::report::ClassificationReport;

/// Model inputs, in column order.
pub const FEATURES: [&str; 6] = ["age", "studytime", "failures", "absences", "G1", "G2"];
pub const TARGET: &str = "G3";
pub const PASS_THRESHOLD: f64 = 10.0;

pub const FAIL: usize = 0;
pub const PASS: usize = 1;

/// Students strictly above the threshold pass.
pub fn label(g3: f64) -> usize {
    if g3 > PASS_THRESHOLD {
        PASS
    } else {
        FAIL
    }
}

/// Class chosen by a Pass vote share; a tied vote goes to Fail.
pub fn majority(p_pass: f64) -> usize {
    if p_pass > 0.5 {
        PASS
    } else {
        FAIL
    }
}

pub fn verdict(class: usize) -> &'static str {
    if class == PASS {
        "Pass"
    } else {
        "Fail"
    }
}

/// Feature matrix and labels for every row of the table.
pub fn prepare_features(table: &StudentTable) -> Result<(Array2<f64>, Array1<usize>)> {
    let columns = FEATURES
        .iter()
        .map(|name| table.numeric_column(name))
        .collect::<Result<Vec<_>>>()?;

    let n = table.nrows();
    let mut records = Array2::zeros((n, FEATURES.len()));
    for (j, col) in columns.iter().enumerate() {
        for (i, v) in col.iter().enumerate() {
            records[[i, j]] = *v;
        }
    }

    let targets = table
        .numeric_column(TARGET)?
        .into_iter()
        .map(label)
        .collect::<Array1<usize>>();

    Ok((records, targets))
}

#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub y_train: Array1<usize>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<usize>,
}

/// Seeded shuffle followed by a train/test cut. The test side gets
/// `ceil(test_fraction * n)` rows.
pub fn train_test_split(
    records: &Array2<f64>,
    targets: &Array1<usize>,
    test_fraction: f64,
    seed: u64,
) -> Result<Split> {
    let n = records.nrows();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::Training(format!(
            "cannot split {} rows with test fraction {}",
            n, test_fraction
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(n_test);

    Ok(Split {
        x_train: records.select(Axis(0), train_idx),
        y_train: targets.select(Axis(0), train_idx),
        x_test: records.select(Axis(0), test_idx),
        y_test: targets.select(Axis(0), test_idx),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Share of the features each tree sees.
    pub feature_fraction: f64,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            feature_fraction: 0.7,
            seed: 42,
        }
    }
}

struct ForestTree {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

/// Bagged decision trees, each grown on a bootstrap sample over a random
/// subset of the features.
pub struct RandomForest {
    trees: Vec<ForestTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(records: &Array2<f64>, targets: &Array1<usize>, params: ForestParams) -> Result<Self> {
        let (n, p) = records.dim();
        if n == 0 || p == 0 {
            return Err(AppError::Training("no training rows".into()));
        }
        if params.n_trees == 0 {
            return Err(AppError::Training("forest needs at least one tree".into()));
        }

        let per_tree = ((params.feature_fraction * p as f64).ceil() as usize).clamp(1, p);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut features = index::sample(&mut rng, p, per_tree).into_vec();
            features.sort_unstable();

            let x = records.select(Axis(0), &rows).select(Axis(1), &features);
            let y = targets.select(Axis(0), &rows);
            let dataset = Dataset::new(x, y);

            let tree = DecisionTree::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(None)
                .fit(&dataset)
                .map_err(|e| AppError::Training(e.to_string()))?;

            trees.push(ForestTree { features, tree });
        }

        debug!(trees = trees.len(), features_per_tree = per_tree, "forest grown");
        Ok(Self { trees, n_features: p })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Pass votes per row, as a fraction of the trees.
    pub fn predict_proba(&self, records: &Array2<f64>) -> Result<Array1<f64>> {
        if records.ncols() != self.n_features {
            return Err(AppError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                records.ncols()
            )));
        }

        let mut votes = Array1::<f64>::zeros(records.nrows());
        for member in &self.trees {
            let x = records.select(Axis(1), &member.features);
            let predicted: Array1<usize> = member.tree.predict(&x);
            for (v, class) in votes.iter_mut().zip(predicted.iter()) {
                if *class == PASS {
                    *v += 1.0;
                }
            }
        }
        Ok(votes / self.trees.len() as f64)
    }

    /// Majority vote per row, see [`majority`].
    pub fn predict(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self.predict_proba(records)?.mapv(majority))
    }
}

/// One student as entered through the prediction sliders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudentInput {
    pub age: f64,
    pub studytime: f64,
    pub failures: f64,
    pub absences: f64,
    #[serde(rename = "G1")]
    pub g1: f64,
    #[serde(rename = "G2")]
    pub g2: f64,
}

/// Inclusive slider range and default for one feature.
#[derive(Debug, Clone, Copy)]
pub struct SliderBounds {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

pub const SLIDERS: [SliderBounds; 6] = [
    SliderBounds { name: "age", label: "Age", min: 10.0, max: 20.0, default: 15.0 },
    SliderBounds { name: "studytime", label: "Studytime (1-4)", min: 1.0, max: 4.0, default: 2.0 },
    SliderBounds { name: "failures", label: "Failures", min: 0.0, max: 3.0, default: 0.0 },
    SliderBounds { name: "absences", label: "Absences", min: 0.0, max: 100.0, default: 10.0 },
    SliderBounds { name: "G1", label: "G1", min: 0.0, max: 20.0, default: 10.0 },
    SliderBounds { name: "G2", label: "G2", min: 0.0, max: 20.0, default: 10.0 },
];

impl Default for StudentInput {
    fn default() -> Self {
        Self::from_values(SLIDERS.map(|s| s.default))
    }
}

impl StudentInput {
    fn from_values(v: [f64; 6]) -> Self {
        Self {
            age: v[0],
            studytime: v[1],
            failures: v[2],
            absences: v[3],
            g1: v[4],
            g2: v[5],
        }
    }

    pub fn values(&self) -> [f64; 6] {
        [self.age, self.studytime, self.failures, self.absences, self.g1, self.g2]
    }

    /// Pins every field into its slider range, rounding to whole steps.
    /// Infinities land on the nearest bound; NaN takes the default.
    pub fn clamped(&self) -> Self {
        let mut v = self.values();
        for (x, bounds) in v.iter_mut().zip(SLIDERS.iter()) {
            let value = if x.is_nan() { bounds.default } else { x.round() };
            // Adding zero folds -0.0 into 0.0.
            *x = value.clamp(bounds.min, bounds.max) + 0.0;
        }
        Self::from_values(v)
    }

    pub fn validate(&self) -> Result<()> {
        for (x, bounds) in self.values().iter().zip(SLIDERS.iter()) {
            if !x.is_finite() || *x < bounds.min || *x > bounds.max {
                return Err(AppError::InvalidInput(format!(
                    "{} must be within [{}, {}], got {}",
                    bounds.name, bounds.min, bounds.max, x
                )));
            }
        }
        Ok(())
    }

    pub fn to_row(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, FEATURES.len()), |(_, j)| self.values()[j])
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
}

/// Model summary served at `/api/model`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelInfo {
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
    pub n_trees: usize,
    pub seed: u64,
    pub features: Vec<String>,
}

/// The fitted forest plus its held-out evaluation.
pub struct TrainedModel {
    forest: RandomForest,
    info: ModelInfo,
}

impl TrainedModel {
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn accuracy(&self) -> f64 {
        self.info.accuracy
    }

    pub fn report(&self) -> &ClassificationReport {
        &self.info.report
    }

    /// Predicted class and the vote share behind it.
    pub fn classify(&self, input: &StudentInput) -> Result<(usize, f64)> {
        let p_pass = self.forest.predict_proba(&input.to_row())?[0];
        let class = majority(p_pass);
        let confidence = if class == PASS { p_pass } else { 1.0 - p_pass };
        Ok((class, confidence))
    }

    pub fn predict(&self, input: &StudentInput) -> Result<PredictResponse> {
        let (class, confidence) = self.classify(input)?;
        Ok(PredictResponse {
            prediction: verdict(class).to_string(),
            confidence,
        })
    }
}

pub fn train_model(
    table: &StudentTable,
    test_fraction: f64,
    params: ForestParams,
) -> Result<TrainedModel> {
    let (records, targets) = prepare_features(table)?;

    let pass_count = targets.iter().filter(|&&y| y == PASS).count();
    info!(
        pass = pass_count,
        fail = targets.len() - pass_count,
        "class distribution"
    );

    let split = train_test_split(&records, &targets, test_fraction, params.seed)?;
    let forest = RandomForest::fit(&split.x_train, &split.y_train, params)?;

    let y_pred = forest.predict(&split.x_test)?;
    let report = ClassificationReport::new(&split.y_test, &y_pred);
    let accuracy = report.accuracy;

    info!(
        train = split.y_train.len(),
        test = split.y_test.len(),
        accuracy = %format!("{:.2}", accuracy),
        "random forest trained"
    );

    Ok(TrainedModel {
        info: ModelInfo {
            accuracy,
            report,
            train_size: split.y_train.len(),
            test_size: split.y_test.len(),
            n_trees: forest.n_trees(),
            seed: params.seed,
            features: FEATURES.iter().map(|f| f.to_string()).collect(),
        },
        forest,
    })
}
