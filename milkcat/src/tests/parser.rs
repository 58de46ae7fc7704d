use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{DependencyModel, LexType, Lexicon, MaxentModel, MaxentModelBuilder};
use crate::{DependencyInstance, DependencyParser, Model};

const JOHN_CSV: &str = include_str!("./resources/john.csv");

fn model_with(dependency: DependencyModel) -> Arc<Model> {
    let lexicon = Lexicon::new([("x", 1.0)], LexType::System).unwrap();
    Arc::new(Model::new(lexicon).unwrap().with_dependency_model(dependency))
}

#[test]
fn test_parse_john_loves_mary() {
    let classifier = MaxentModel::from_reader(JOHN_CSV.as_bytes()).unwrap();
    let dependency = DependencyModel::new(classifier, ["BIAS", "STw=[STw]", "N0w=[N0w]"]);
    let mut parser = DependencyParser::new(model_with(dependency)).unwrap();

    let mut tree = DependencyInstance::new();
    parser
        .parse(&["John", "loves", "Mary"], &["NNP", "VBZ", "NNP"], &mut tree)
        .unwrap();
    assert_eq!(tree.len(), 3);
    assert_eq!((tree.head(0), tree.label(0)), (2, "nsubj"));
    assert_eq!((tree.head(1), tree.label(1)), (0, "ROOT"));
    assert_eq!((tree.head(2), tree.label(2)), (2, "dobj"));
    // SHIFT, LARC_nsubj, RARC_ROOT, RARC_dobj
    assert_eq!(parser.num_transitions(), 4);
}

#[test]
fn test_parse_reuses_tree() {
    let classifier = MaxentModel::from_reader(JOHN_CSV.as_bytes()).unwrap();
    let dependency = DependencyModel::new(classifier, ["BIAS", "STw=[STw]", "N0w=[N0w]"]);
    let mut parser = DependencyParser::new(model_with(dependency)).unwrap();

    let mut tree = DependencyInstance::new();
    parser
        .parse(&["John", "loves", "Mary"], &["NNP", "VBZ", "NNP"], &mut tree)
        .unwrap();
    parser.parse(&["loves"], &["VBZ"], &mut tree).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!((tree.head(0), tree.label(0)), (0, "ROOT"));

    let words: [&str; 0] = [];
    parser.parse(&words, &words, &mut tree).unwrap();
    assert!(tree.is_empty());
    assert_eq!(parser.num_transitions(), 0);
}

const LABELS: [&str; 6] = ["SHIFT", "REDUCE", "LARC_a", "RARC_a", "LARC_b", "RARC_b"];
const WORDS: [&str; 3] = ["p", "q", "r"];
const TAGS: [&str; 2] = ["X", "Y"];

/// Random classifier over features of the stack top and the next words.
fn random_parser(rng: &mut StdRng) -> DependencyParser {
    let mut builder = MaxentModelBuilder::new(&LABELS).unwrap();
    let mut values: Vec<String> = vec!["BIAS".to_string()];
    for slot in ["STw", "N0w", "N1w"] {
        for value in WORDS.iter().chain(["ROOT", "NULL"].iter()) {
            values.push(format!("{slot}={value}"));
        }
    }
    for slot in ["STt", "N0t", "STPt", "STLCt", "STRCt", "N0LCt", "N2t"] {
        for value in TAGS.iter().chain(["ROOT", "NULL"].iter()) {
            values.push(format!("{slot}={value}"));
        }
    }
    for feature in &values {
        for label in LABELS {
            if rng.gen_bool(0.3) {
                builder
                    .add(feature, label, rng.gen_range(-3.0..3.0))
                    .unwrap();
            }
        }
    }
    let templates = [
        "BIAS",
        "STw=[STw]",
        "N0w=[N0w]",
        "N1w=[N1w]",
        "STt=[STt]",
        "N0t=[N0t]",
        "STPt=[STPt]",
        "STLCt=[STLCt]",
        "STRCt=[STRCt]",
        "N0LCt=[N0LCt]",
        "N2t=[N2t]",
    ];
    let dependency = DependencyModel::new(builder.build(), templates);
    DependencyParser::new(model_with(dependency)).unwrap()
}

fn assert_tree(tree: &DependencyInstance) {
    let len = tree.len();
    for i in 0..len {
        assert!(tree.head(i) <= len);
        assert_ne!(tree.head(i), i + 1);
        assert!(!tree.label(i).is_empty());
    }
    // Following heads from any word reaches the root.
    for i in 0..len {
        let mut node = i + 1;
        let mut steps = 0;
        while node != 0 {
            node = tree.head(node - 1);
            steps += 1;
            assert!(steps <= len, "cycle through word {}", i + 1);
        }
    }
}

#[test]
fn test_random_classifier_gives_tree() {
    let mut rng = StdRng::seed_from_u64(6);
    for _ in 0..30 {
        let mut parser = random_parser(&mut rng);
        let mut tree = DependencyInstance::new();
        for _ in 0..10 {
            let len = rng.gen_range(1..=8);
            let words: Vec<_> = (0..len)
                .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
                .collect();
            let tags: Vec<_> = (0..len)
                .map(|_| TAGS[rng.gen_range(0..TAGS.len())])
                .collect();
            parser.parse(&words, &tags, &mut tree).unwrap();
            assert_eq!(tree.len(), len);
            assert_tree(&tree);
            assert!(parser.num_transitions() <= 2 * len);

            let heads: Vec<_> = (0..len).map(|i| tree.head(i)).collect();
            parser.parse(&words, &tags, &mut tree).unwrap();
            let again: Vec<_> = (0..len).map(|i| tree.head(i)).collect();
            assert_eq!(heads, again);
        }
    }
}
