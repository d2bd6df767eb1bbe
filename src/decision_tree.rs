use crate::classifier::{Classifier, ClassifierError};
use crate::criterion::Criterion;
use crate::dataset::{DataSet, Example};
use crate::functions;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Feature value that sends an example down the left branch.
pub const LEFT_BRANCH: f64 = 0.0;

/// Feature value that sends an example down the right branch.
pub const RIGHT_BRANCH: f64 = 1.0;

/// Label predicted by an untrained tree and seeded as the root's parent majority.
pub const DEFAULT_LABEL: f64 = 0.0;

/// Decision tree options.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeOptions {
    depth_limit: Option<usize>,
    criterion: Criterion,
    parallel: bool,
}

impl DecisionTreeOptions {
    /// Makes a `DecisionTreeOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the depth at which nodes stop splitting.
    ///
    /// `0` yields a single leaf and any negative value grows the tree until another stopping
    /// rule fires. The default value is `-1`.
    pub fn depth_limit(&mut self, depth: i64) -> &mut Self {
        self.depth_limit = if depth < 0 { None } else { Some(depth as usize) };
        self
    }

    /// Sets how candidate split features are scored.
    ///
    /// The default value is `Criterion::TrainingError`.
    pub fn criterion(&mut self, criterion: Criterion) -> &mut Self {
        self.criterion = criterion;
        self
    }

    /// Scores candidate split features in parallel.
    ///
    /// This library use `rayon` for parallel execution.
    /// The learned tree is the same as the one learned sequentially.
    pub fn parallel(&mut self) -> &mut Self {
        self.parallel = true;
        self
    }

    /// Builds a tree fitting the given data set.
    pub fn fit(&self, data: &DataSet) -> Result<DecisionTreeClassifier, ClassifierError> {
        let mut classifier = DecisionTreeClassifier {
            options: self.clone(),
            ..Default::default()
        };
        classifier.train(data)?;
        Ok(classifier)
    }
}

/// Binary decision tree over features that take the values [`LEFT_BRANCH`] or [`RIGHT_BRANCH`].
///
/// Classifying before training predicts `0.0`.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeClassifier {
    options: DecisionTreeOptions,
    feature_names: BTreeMap<usize, String>,
    root: Option<Node>,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`DecisionTreeOptions::depth_limit`].
    pub fn set_depth_limit(&mut self, depth: i64) {
        self.options.depth_limit(depth);
    }

    pub fn options_mut(&mut self) -> &mut DecisionTreeOptions {
        &mut self.options
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    fn predict(&self, example: &Example) -> Result<(f64, f64), ClassifierError> {
        match &self.root {
            Some(root) => root.predict(example),
            None => Ok((DEFAULT_LABEL, 0.0)),
        }
    }
}

impl Classifier for DecisionTreeClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        let features = data.feature_indices().collect::<Vec<_>>();
        let examples = data.examples().iter().collect::<Vec<_>>();
        let builder = NodeBuilder {
            features: &features,
            depth_limit: self.options.depth_limit,
            criterion: self.options.criterion,
            parallel: self.options.parallel,
        };
        let root = builder.build(&examples, &BTreeSet::new(), 0, DEFAULT_LABEL)?;

        self.root = Some(root);
        self.feature_names = data.feature_names().clone();
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.predict(example).map(|(label, _)| label)
    }

    /// Returns the fraction of training examples at the reached leaf that share its label.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.predict(example).map(|(_, confidence)| confidence)
    }
}

impl fmt::Display for DecisionTreeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.root {
            Some(root) => root.fmt_indented(f, &self.feature_names, 0),
            None => Node::Leaf {
                label: DEFAULT_LABEL,
                confidence: 0.0,
            }
            .fmt_indented(f, &self.feature_names, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf { label: f64, confidence: f64 },
    Internal { children: Children },
}

impl Node {
    fn leaf(label: f64, examples: &[&Example]) -> Self {
        let confidence = if examples.is_empty() {
            0.0
        } else {
            let hits = examples.iter().filter(|e| e.label() == label).count();
            hits as f64 / examples.len() as f64
        };
        Self::Leaf { label, confidence }
    }

    fn predict(&self, example: &Example) -> Result<(f64, f64), ClassifierError> {
        match self {
            Self::Leaf { label, confidence } => Ok((*label, *confidence)),
            Self::Internal { children } => {
                match Branch::of(children.feature, example.feature(children.feature))? {
                    Branch::Left => children.left.predict(example),
                    Branch::Right => children.right.predict(example),
                }
            }
        }
    }

    /// Number of internal nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { children } => {
                1 + std::cmp::max(children.left.depth(), children.right.depth())
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { children } => {
                children.left.leaf_count() + children.right.leaf_count()
            }
        }
    }

    fn fmt_indented(
        &self,
        f: &mut fmt::Formatter,
        names: &BTreeMap<usize, String>,
        indent: usize,
    ) -> fmt::Result {
        match self {
            Self::Leaf { label, confidence } => writeln!(
                f,
                "{:indent$}predict {} ({:.2})",
                "",
                label,
                confidence,
                indent = indent
            ),
            Self::Internal { children } => {
                let name = names
                    .get(&children.feature)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", children.feature));
                writeln!(
                    f,
                    "{:indent$}if {} == {}:",
                    "",
                    name,
                    LEFT_BRANCH,
                    indent = indent
                )?;
                children.left.fmt_indented(f, names, indent + 2)?;
                writeln!(f, "{:indent$}else:", "", indent = indent)?;
                children.right.fmt_indented(f, names, indent + 2)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Children {
    feature: usize,
    left: Box<Node>,
    right: Box<Node>,
}

impl Children {
    /// Index of the feature this node splits on.
    pub fn feature(&self) -> usize {
        self.feature
    }

    /// Subtree for examples whose feature equals [`LEFT_BRANCH`].
    pub fn left(&self) -> &Node {
        &self.left
    }

    /// Subtree for examples whose feature equals [`RIGHT_BRANCH`].
    pub fn right(&self) -> &Node {
        &self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Left,
    Right,
}

impl Branch {
    fn of(index: usize, value: f64) -> Result<Self, ClassifierError> {
        if value == LEFT_BRANCH {
            Ok(Self::Left)
        } else if value == RIGHT_BRANCH {
            Ok(Self::Right)
        } else {
            Err(ClassifierError::InvalidFeatureValue { index, value })
        }
    }
}

#[derive(Debug)]
struct NodeBuilder<'a> {
    features: &'a [usize],
    depth_limit: Option<usize>,
    criterion: Criterion,
    parallel: bool,
}

impl NodeBuilder<'_> {
    fn build(
        &self,
        examples: &[&Example],
        used: &BTreeSet<usize>,
        depth: usize,
        parent_majority: f64,
    ) -> Result<Node, ClassifierError> {
        let majority = functions::most_frequent(examples.iter().map(|e| e.label()))
            .map_or(parent_majority, |(label, _)| label);

        if labels_are_equal(examples) {
            return Ok(Node::leaf(majority, examples));
        }
        if features_are_equal(examples) {
            return Ok(Node::leaf(majority, examples));
        }
        if used.len() >= self.features.len() {
            return Ok(Node::leaf(majority, examples));
        }
        if examples.is_empty() {
            return Ok(Node::leaf(parent_majority, examples));
        }
        if self.depth_limit.map_or(false, |limit| depth >= limit) {
            return Ok(Node::leaf(majority, examples));
        }

        if let Some(feature) = self.select_split_feature(used, examples)? {
            let (left, right) = split_by_feature(feature, examples)?;
            let mut used = used.clone();
            used.insert(feature);

            let left = Box::new(self.build(&left, &used, depth + 1, majority)?);
            let right = Box::new(self.build(&right, &used, depth + 1, majority)?);
            Ok(Node::Internal {
                children: Children {
                    feature,
                    left,
                    right,
                },
            })
        } else {
            Ok(Node::leaf(majority, examples))
        }
    }

    /// Returns the unused feature with the lowest score; the lowest index wins ties.
    fn select_split_feature(
        &self,
        used: &BTreeSet<usize>,
        examples: &[&Example],
    ) -> Result<Option<usize>, ClassifierError> {
        let candidates = self
            .features
            .iter()
            .copied()
            .filter(|f| !used.contains(f))
            .collect::<Vec<_>>();
        let scores = if self.parallel {
            candidates
                .par_iter()
                .map(|&feature| self.score(feature, examples))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            candidates
                .iter()
                .map(|&feature| self.score(feature, examples))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut best: Option<(usize, f64)> = None;
        for (feature, score) in candidates.into_iter().zip(scores) {
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((feature, score));
            }
        }
        Ok(best.map(|(feature, _)| feature))
    }

    fn score(&self, feature: usize, examples: &[&Example]) -> Result<f64, ClassifierError> {
        let (left, right) = split_by_feature(feature, examples)?;
        let left = functions::histogram(left.iter().map(|e| e.label()));
        let right = functions::histogram(right.iter().map(|e| e.label()));
        Ok(self.criterion.score(&left, &right))
    }
}

fn split_by_feature<'a>(
    feature: usize,
    examples: &[&'a Example],
) -> Result<(Vec<&'a Example>, Vec<&'a Example>), ClassifierError> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &example in examples {
        match Branch::of(feature, example.feature(feature))? {
            Branch::Left => left.push(example),
            Branch::Right => right.push(example),
        }
    }
    Ok((left, right))
}

fn labels_are_equal(examples: &[&Example]) -> bool {
    match examples.split_first() {
        Some((first, rest)) => rest.iter().all(|e| e.label() == first.label()),
        None => false,
    }
}

fn features_are_equal(examples: &[&Example]) -> bool {
    match examples.split_first() {
        Some((first, rest)) => rest.iter().all(|e| e.equal_features(first)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSetBuilder;

    fn single_feature_data() -> Result<DataSet, anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.set_feature_names(&["sex"])?;
        builder.add_row(&[LEFT_BRANCH], 1.0)?;
        builder.add_row(&[RIGHT_BRANCH], -1.0)?;
        builder.add_row(&[LEFT_BRANCH], 1.0)?;
        builder.add_row(&[RIGHT_BRANCH], -1.0)?;
        Ok(builder.build())
    }

    fn three_feature_data() -> Result<DataSet, anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        for i in 0..16 {
            let xs = [(i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64];
            let y = if (xs[0] != xs[1]) || xs[2] == 1.0 {
                1.0
            } else {
                -1.0
            };
            builder.add_row(&xs, y)?;
        }
        Ok(builder.build())
    }

    fn assert_no_repeated_feature(node: &Node, path: &mut Vec<usize>) {
        if let Node::Internal { children } = node {
            assert!(!path.contains(&children.feature()));
            path.push(children.feature());
            assert_no_repeated_feature(children.left(), path);
            assert_no_repeated_feature(children.right(), path);
            path.pop();
        }
    }

    #[test]
    fn splits_on_the_only_feature() -> Result<(), anyhow::Error> {
        let tree = DecisionTreeOptions::new().fit(&single_feature_data()?)?;

        let expected = Node::Internal {
            children: Children {
                feature: 0,
                left: Box::new(Node::Leaf {
                    label: 1.0,
                    confidence: 1.0,
                }),
                right: Box::new(Node::Leaf {
                    label: -1.0,
                    confidence: 1.0,
                }),
            },
        };
        assert_eq!(tree.root(), Some(&expected));

        let held_out = Example::new(-1.0).with_feature(0, LEFT_BRANCH);
        assert_eq!(tree.classify(&held_out)?, 1.0);
        assert_eq!(
            tree.to_string(),
            "if sex == 0:\n  predict 1 (1.00)\nelse:\n  predict -1 (1.00)\n"
        );
        Ok(())
    }

    #[test]
    fn empty_data_predicts_default_label() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.set_feature_names(&["a", "b"])?;
        let tree = DecisionTreeOptions::new().fit(&builder.build())?;

        assert_eq!(
            tree.root(),
            Some(&Node::Leaf {
                label: 0.0,
                confidence: 0.0
            })
        );
        assert_eq!(tree.classify(&Example::from_dense(1.0, &[1.0, 0.0]))?, 0.0);
        Ok(())
    }

    #[test]
    fn untrained_tree_predicts_default_label() -> Result<(), anyhow::Error> {
        let tree = DecisionTreeClassifier::new();
        assert_eq!(tree.classify(&Example::from_dense(1.0, &[1.0]))?, 0.0);
        assert_eq!(tree.confidence(&Example::from_dense(1.0, &[1.0]))?, 0.0);
        assert_eq!(tree.to_string(), "predict 0 (0.00)\n");
        Ok(())
    }

    #[test]
    fn depth_zero_is_a_single_majority_leaf() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[0.0, 1.0], 1.0)?;
        builder.add_row(&[1.0, 1.0], -1.0)?;
        builder.add_row(&[1.0, 0.0], -1.0)?;
        let tree = DecisionTreeOptions::new()
            .depth_limit(0)
            .fit(&builder.build())?;

        match tree.root() {
            Some(Node::Leaf { label, .. }) => assert_eq!(*label, -1.0),
            other => panic!("expected a single leaf, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn single_label_data_always_predicts_it() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[0.0, 1.0], 2.0)?;
        builder.add_row(&[1.0, 0.0], 2.0)?;
        let tree = DecisionTreeOptions::new().fit(&builder.build())?;

        assert_eq!(tree.root().map(Node::leaf_count), Some(1));
        assert_eq!(tree.classify(&Example::from_dense(0.0, &[1.0, 1.0]))?, 2.0);
        Ok(())
    }

    #[test]
    fn identical_features_yield_majority_leaf() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[1.0, 0.0], 1.0)?;
        builder.add_row(&[1.0, 0.0], -1.0)?;
        builder.add_row(&[1.0, 0.0], -1.0)?;
        let tree = DecisionTreeOptions::new().fit(&builder.build())?;

        assert_eq!(
            tree.root(),
            Some(&Node::Leaf {
                label: -1.0,
                confidence: 2.0 / 3.0
            })
        );
        Ok(())
    }

    #[test]
    fn empty_branch_takes_parent_majority() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[0.0, 0.0], 1.0)?;
        builder.add_row(&[0.0, 0.0], 1.0)?;
        builder.add_row(&[1.0, 0.0], -1.0)?;
        builder.add_row(&[1.0, 0.0], 1.0)?;
        builder.add_row(&[1.0, 0.0], -1.0)?;
        let data = builder.build();
        let tree = DecisionTreeOptions::new().fit(&data)?;

        // `f1` is constant, so the right partition of `f0` is already feature-identical.
        assert_eq!(tree.root().map(Node::depth), Some(1));
        assert_eq!(tree.classify(&Example::from_dense(0.0, &[1.0, 0.0]))?, -1.0);

        let builder = NodeBuilder {
            features: &[0, 1],
            depth_limit: None,
            criterion: Criterion::TrainingError,
            parallel: false,
        };
        let used = [0].iter().copied().collect::<BTreeSet<_>>();
        let node = builder.build(&[], &used, 1, -1.0)?;
        assert_eq!(
            node,
            Node::Leaf {
                label: -1.0,
                confidence: 0.0
            }
        );
        Ok(())
    }

    #[test]
    fn depth_limit_bounds_every_path() -> Result<(), anyhow::Error> {
        let data = three_feature_data()?;
        for limit in -1..=4 {
            let tree = DecisionTreeOptions::new().depth_limit(limit).fit(&data)?;
            let root = tree.root().expect("trained");
            if limit >= 0 {
                assert!(root.depth() <= limit as usize);
            }
            assert!(root.depth() <= data.features_len());
            assert_no_repeated_feature(root, &mut Vec::new());
        }
        Ok(())
    }

    #[test]
    fn full_tree_fits_consistent_training_data() -> Result<(), anyhow::Error> {
        let data = three_feature_data()?;
        let tree = DecisionTreeOptions::new().fit(&data)?;
        for example in data.examples() {
            assert_eq!(tree.classify(example)?, example.label());
        }
        Ok(())
    }

    #[test]
    fn training_is_deterministic_and_parallel_agrees() -> Result<(), anyhow::Error> {
        let data = three_feature_data()?;
        let first = DecisionTreeOptions::new().fit(&data)?;
        let second = DecisionTreeOptions::new().fit(&data)?;
        let parallel = DecisionTreeOptions::new().parallel().fit(&data)?;
        assert_eq!(first.root(), second.root());
        assert_eq!(first.root(), parallel.root());

        for &criterion in &[Criterion::Gini, Criterion::Entropy] {
            let tree = DecisionTreeOptions::new().criterion(criterion).fit(&data)?;
            for example in data.examples() {
                assert_eq!(tree.classify(example)?, example.label());
            }
        }
        Ok(())
    }

    #[test]
    fn split_partitions_every_example_once() -> Result<(), anyhow::Error> {
        let data = three_feature_data()?;
        let examples = data.examples().iter().collect::<Vec<_>>();
        for feature in 0..3 {
            let (left, right) = split_by_feature(feature, &examples)?;
            assert_eq!(left.len() + right.len(), examples.len());
            assert!(left.iter().all(|e| e.feature(feature) == LEFT_BRANCH));
            assert!(right.iter().all(|e| e.feature(feature) == RIGHT_BRANCH));
        }
        Ok(())
    }

    #[test]
    fn non_binary_feature_values_are_rejected() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[0.0], 1.0)?;
        builder.add_row(&[0.5], -1.0)?;
        let result = DecisionTreeOptions::new().fit(&builder.build());
        assert_eq!(
            result.err(),
            Some(ClassifierError::InvalidFeatureValue {
                index: 0,
                value: 0.5
            })
        );

        let tree = DecisionTreeOptions::new().fit(&single_feature_data()?)?;
        assert_eq!(
            tree.classify(&Example::from_dense(1.0, &[2.0])),
            Err(ClassifierError::InvalidFeatureValue {
                index: 0,
                value: 2.0
            })
        );
        Ok(())
    }
}
