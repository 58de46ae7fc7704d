use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{CrfModel, CrfModelBuilder, LexType, Lexicon};
use crate::{CrfTagger, Model, Segmenter, Sentence, TermFeatures, TermInstance};

const POS_CRF: &str = include_str!("./resources/pos.crf");

fn pos_model() -> Model {
    let lexicon =
        Lexicon::new([("猫", 1.0), ("吃", 1.0), ("鱼", 1.0)], LexType::System).unwrap();
    let crf = CrfModel::from_reader(POS_CRF.as_bytes()).unwrap();
    Model::new(lexicon).unwrap().with_pos_model(crf)
}

#[test]
fn test_tag_terms() {
    let model = Arc::new(pos_model());
    let mut segmenter = Segmenter::new(Arc::clone(&model));
    let mut tagger = CrfTagger::new(model).unwrap();

    let mut sent = Sentence::new();
    sent.set_sentence("猫吃鱼");
    let mut terms = TermInstance::default();
    segmenter.segment(&sent, &mut terms).unwrap();

    let mut tags = vec![];
    let cost = tagger.tag(&TermFeatures(&terms), &mut tags).unwrap();
    let names: Vec<_> = tags.iter().map(|&t| tagger.tag_name(t).unwrap()).collect();
    assert_eq!(names, vec!["N", "V", "N"]);
    assert!((cost + 3.0).abs() < 1e-9);
    assert_eq!(tagger.tag_id("V"), Some(1));
    assert_eq!(tagger.tag_id("ADJ"), None);
    assert_eq!(tagger.tag_name(2), None);
}

#[test]
fn test_tag_empty() {
    let mut tagger = CrfTagger::new(Arc::new(pos_model())).unwrap();
    let rows: Vec<Vec<String>> = vec![];
    let mut tags = vec![1];
    let cost = tagger.tag(rows.as_slice(), &mut tags).unwrap();
    assert!(tags.is_empty());
    assert_eq!(cost, 0.0);
}

const VOCAB: [&str; 3] = ["甲", "乙", "丙"];

fn random_costs(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len)
        .map(|_| f32::from(rng.gen_range(0u8..=16)) / 4.0 - 2.0)
        .collect()
}

/// Random CRF over `U00:%x[0,0]`, `U01:%x[-1,0]`, `B` and `B01:%x[0,0]`.
/// Each feature is registered with probability 1/2.
fn random_crf(rng: &mut StdRng, num_tags: usize) -> CrfModel {
    let tags: Vec<_> = (0..num_tags).map(|i| format!("T{i}")).collect();
    let mut builder = CrfModelBuilder::new(&tags, 1).unwrap();
    for template in ["U00:%x[0,0]", "U01:%x[-1,0]", "B", "B01:%x[0,0]"] {
        builder.template(template).unwrap();
    }
    for word in VOCAB {
        if rng.gen_bool(0.5) {
            let costs = random_costs(rng, num_tags);
            builder.add_unigram_feature(format!("U00:{word}"), &costs).unwrap();
        }
    }
    for word in VOCAB.iter().copied().chain(["_B-1"]) {
        if rng.gen_bool(0.5) {
            let costs = random_costs(rng, num_tags);
            builder.add_unigram_feature(format!("U01:{word}"), &costs).unwrap();
        }
    }
    let costs = random_costs(rng, num_tags * num_tags);
    builder.add_bigram_feature("B", &costs).unwrap();
    for word in VOCAB.iter().copied().chain(["_B+1"]) {
        if rng.gen_bool(0.5) {
            let costs = random_costs(rng, num_tags * num_tags);
            builder.add_bigram_feature(format!("B01:{word}"), &costs).unwrap();
        }
    }
    builder.build().unwrap()
}

fn emission(crf: &CrfModel, words: &[&str], pos: usize, tag: usize) -> f64 {
    let prev = if pos == 0 { "_B-1" } else { words[pos - 1] };
    [format!("U00:{}", words[pos]), format!("U01:{prev}")]
        .iter()
        .filter_map(|f| crf.feature_id(f))
        .map(|id| f64::from(crf.unigram_cost(id, tag)))
        .sum()
}

fn transition(crf: &CrfModel, words: &[&str], pos: usize, left: usize, right: usize) -> f64 {
    let word = words.get(pos).copied().unwrap_or("_B+1");
    ["B".to_string(), format!("B01:{word}")]
        .iter()
        .filter_map(|f| crf.feature_id(f))
        .map(|id| f64::from(crf.bigram_cost(id, left, right)))
        .sum()
}

fn path_cost(
    crf: &CrfModel,
    words: &[&str],
    begin: usize,
    begin_tag: Option<usize>,
    end_tag: Option<usize>,
    tags: &[usize],
) -> f64 {
    let end = begin + tags.len();
    let mut cost = 0.0;
    for (i, &tag) in tags.iter().enumerate() {
        let pos = begin + i;
        cost += emission(crf, words, pos, tag);
        if i != 0 {
            cost += transition(crf, words, pos, tags[i - 1], tag);
        }
    }
    if let Some(left) = begin_tag {
        cost += transition(crf, words, begin, left, tags[0]);
    }
    if let Some(right) = end_tag {
        cost += transition(crf, words, end, tags[tags.len() - 1], right);
    }
    cost
}

fn brute_force(
    crf: &CrfModel,
    words: &[&str],
    begin: usize,
    end: usize,
    begin_tag: Option<usize>,
    end_tag: Option<usize>,
) -> f64 {
    let num_tags = crf.num_tags();
    let len = end - begin;
    let mut best = f64::INFINITY;
    let mut tags = vec![0; len];
    for mut code in 0..num_tags.pow(len as u32) {
        for tag in tags.iter_mut() {
            *tag = code % num_tags;
            code /= num_tags;
        }
        best = best.min(path_cost(crf, words, begin, begin_tag, end_tag, &tags));
    }
    best
}

#[test]
fn test_viterbi_optimality() {
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..30 {
        let num_tags = rng.gen_range(1..=4);
        let model = Arc::new(
            Model::new(Lexicon::new([("甲", 1.0)], LexType::System).unwrap())
                .unwrap()
                .with_pos_model(random_crf(&mut rng, num_tags)),
        );
        let mut tagger = CrfTagger::new(Arc::clone(&model)).unwrap();
        let crf = model.pos_model().unwrap();

        for _ in 0..10 {
            let len = rng.gen_range(1..=6);
            let words: Vec<&str> = (0..len)
                .map(|_| VOCAB[rng.gen_range(0..VOCAB.len())])
                .collect();
            let rows: Vec<Vec<&str>> = words.iter().map(|&w| vec![w]).collect();
            let mut tags = vec![];

            let cost = tagger.tag(rows.as_slice(), &mut tags).unwrap();
            let expected = brute_force(crf, &words, 0, len, None, None);
            assert!((cost - expected).abs() < 1e-9, "{words:?}");
            assert!((path_cost(crf, &words, 0, None, None, &tags) - cost).abs() < 1e-9);

            let begin = rng.gen_range(0..len);
            let end = rng.gen_range(begin + 1..=len);
            let begin_tag = (begin != 0).then(|| rng.gen_range(0..num_tags));
            let end_tag = rng.gen_bool(0.5).then(|| rng.gen_range(0..num_tags));
            let cost = tagger
                .tag_range(rows.as_slice(), begin, end, begin_tag, end_tag, &mut tags)
                .unwrap();
            assert_eq!(tags.len(), end - begin);
            let expected = brute_force(crf, &words, begin, end, begin_tag, end_tag);
            assert!((cost - expected).abs() < 1e-9, "{words:?} {begin}..{end}");
            assert!(
                (path_cost(crf, &words, begin, begin_tag, end_tag, &tags) - cost).abs() < 1e-9
            );
        }
    }
}

#[test]
fn test_probability_sums_to_one() {
    let mut rng = StdRng::seed_from_u64(5);
    let crf = random_crf(&mut rng, 4);
    let model = Model::new(Lexicon::new([("甲", 1.0)], LexType::System).unwrap())
        .unwrap()
        .with_pos_model(crf);
    let mut tagger = CrfTagger::new(Arc::new(model)).unwrap();
    let rows = vec![vec!["甲"], vec!["乙"], vec!["丙"]];
    let mut probs = vec![];
    for position in 0..rows.len() {
        tagger
            .probability_at(rows.as_slice(), position, &mut probs)
            .unwrap();
        assert_eq!(probs.len(), 4);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
