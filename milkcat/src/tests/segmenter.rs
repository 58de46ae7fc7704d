use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::OOV_COST;
use crate::model::{LexType, Lexicon, WordIdx};
use crate::token::TokenType;
use crate::{Model, Segmenter, Sentence, TermInstance};

const LEXICON_CSV: &str = include_str!("./resources/lexicon.csv");
const USER_CSV: &str = include_str!("./resources/user.csv");
const BIGRAM_CSV: &str = include_str!("./resources/bigram.csv");

const MILKCAT: &str = "这个是MilkCat的简单测试。";

fn system_model() -> Model {
    Model::new(Lexicon::from_reader(LEXICON_CSV.as_bytes(), LexType::System).unwrap()).unwrap()
}

fn segment(segmenter: &mut Segmenter, text: &str) -> TermInstance {
    let mut sent = Sentence::new();
    sent.set_sentence(text);
    let mut terms = TermInstance::default();
    segmenter.segment(&sent, &mut terms).unwrap();
    terms
}

fn assert_tiling(terms: &TermInstance, len_token: usize) {
    let mut pos = 0;
    for term in terms {
        assert_eq!(term.range_token().start, pos);
        assert!(term.range_token().end > pos);
        pos = term.range_token().end;
    }
    assert_eq!(pos, len_token);
}

#[test]
fn test_segment_milkcat() {
    let mut segmenter = Segmenter::new(Arc::new(system_model()));
    let terms = segment(&mut segmenter, MILKCAT);

    let words: Vec<_> = terms.iter().map(|t| t.text()).collect();
    assert_eq!(
        words,
        vec!["这个", "是", "MilkCat", "的", "简单", "测试", "。"]
    );
    let types: Vec<_> = terms.iter().map(|t| t.term_type()).collect();
    assert_eq!(
        types,
        vec![
            TokenType::Chinese,
            TokenType::Chinese,
            TokenType::English,
            TokenType::Chinese,
            TokenType::Chinese,
            TokenType::Chinese,
            TokenType::Punctuation,
        ]
    );
    assert_eq!(terms.term(2).range_byte(), 9..16);
    assert!(terms.iter().all(|t| t.word_idx().lex_type == LexType::System));
    assert!((terms.total_cost() - 8.5).abs() < 1e-6);
    assert_tiling(&terms, 10);
}

#[test]
fn test_segment_user_lexicon() {
    let user = Lexicon::from_reader(USER_CSV.as_bytes(), LexType::User).unwrap();
    let model = system_model().with_user_lexicon(user).unwrap();
    let mut segmenter = Segmenter::new(Arc::new(model));
    let terms = segment(&mut segmenter, MILKCAT);

    let words: Vec<_> = terms.iter().map(|t| t.text()).collect();
    assert_eq!(words, vec!["这个", "是", "MilkCat", "的", "简单测试", "。"]);
    assert_eq!(terms.term(4).word_idx(), WordIdx::new(LexType::User, 0));
    assert_eq!(terms.term(4).term_type(), TokenType::Chinese);
}

#[test]
fn test_segment_bigram() {
    let model = system_model()
        .with_bigram_from_reader(BIGRAM_CSV.as_bytes())
        .unwrap();
    let mut segmenter = Segmenter::new(Arc::new(model));
    let terms = segment(&mut segmenter, MILKCAT);

    let words: Vec<_> = terms.iter().map(|t| t.text()).collect();
    assert_eq!(
        words,
        vec!["这个", "是", "MilkCat", "的", "简单", "测试", "。"]
    );
    // 1.5 + 0.5 + 1.0 + 0.5 + 1.0 + 0.5 + 0.1
    assert!((terms.total_cost() - 5.1).abs() < 1e-5);
}

#[test]
fn test_oov_fallback() {
    let mut segmenter = Segmenter::new(Arc::new(system_model()));
    let terms = segment(&mut segmenter, "这个是猫的2个测试");

    let words: Vec<_> = terms.iter().map(|t| t.text()).collect();
    assert_eq!(words, vec!["这个", "是", "猫", "的", "2", "个", "测试"]);
    assert!(terms.term(2).word_idx().is_oov());
    assert!(terms.term(4).word_idx().is_oov());
    assert_eq!(terms.term(4).term_type(), TokenType::Number);
    assert_eq!(terms.term(5).word_idx().lex_type, LexType::System);
    assert_tiling(&terms, 9);
}

#[test]
fn test_all_oov() {
    let lexicon = Lexicon::new([("甲乙丙", 1.0)], LexType::System).unwrap();
    let mut segmenter = Segmenter::new(Arc::new(Model::new(lexicon).unwrap()));
    let terms = segment(&mut segmenter, "甲乙丁");
    assert_eq!(terms.len(), 3);
    assert!(terms.iter().all(|t| t.word_idx().is_oov()));
    assert!((terms.total_cost() - 3.0 * f64::from(OOV_COST)).abs() < 1e-6);
}

#[test]
fn test_segment_reuse() {
    let mut segmenter = Segmenter::new(Arc::new(system_model()));
    let mut sent = Sentence::new();
    let mut terms = TermInstance::default();
    sent.set_sentence(MILKCAT);
    segmenter.segment(&sent, &mut terms).unwrap();
    assert_eq!(terms.len(), 7);
    sent.set_sentence("测试");
    segmenter.segment(&sent, &mut terms).unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms.term(0).text(), "测试");
}

#[test]
fn test_pushed_tokens() {
    let mut segmenter = Segmenter::new(Arc::new(system_model()));
    let mut sent = Sentence::new();
    sent.push_token("这", TokenType::Chinese);
    sent.push_token("个", TokenType::Chinese);
    sent.push_token("Milk", TokenType::English);
    sent.push_token("Cat", TokenType::English);
    let mut terms = TermInstance::default();
    segmenter.segment(&sent, &mut terms).unwrap();
    let words: Vec<_> = terms.iter().map(|t| t.text()).collect();
    assert_eq!(words, vec!["这个", "MilkCat"]);
    // A word spanning several tokens is typed as Chinese whatever the
    // tokens are.
    assert_eq!(terms.term(1).term_type(), TokenType::Chinese);
    assert_eq!(terms.term(1).range_token(), 2..4);
    assert_eq!(terms.term(1).range_byte(), 6..13);
}

const ALPHABET: [char; 4] = ['甲', '乙', '丙', '丁'];

fn random_word(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

/// Random lexicon containing every single character, so that any
/// partition into lexicon words covers the input.
fn random_lexicon(rng: &mut StdRng) -> Vec<(String, f32)> {
    let mut words: Vec<String> = ALPHABET.iter().map(|c| c.to_string()).collect();
    for _ in 0..12 {
        let word = random_word(rng, 3);
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
        .into_iter()
        .map(|w| (w, f32::from(rng.gen_range(1u8..=20)) / 4.0))
        .collect()
}

fn random_bigram(rng: &mut StdRng, lexicon: &[(String, f32)]) -> String {
    let mut rows = String::new();
    for (left, _) in lexicon {
        for (right, _) in lexicon {
            if rng.gen_bool(0.3) {
                let cost = f32::from(rng.gen_range(0u8..=20)) / 4.0;
                rows.push_str(&format!("{left},{right},{cost}\n"));
            }
        }
    }
    rows
}

/// Minimum cost over all partitions of `chars` into lexicon words.
fn brute_force(
    chars: &[char],
    lexicon: &[(String, f32)],
    bigram: &hashbrown::HashMap<(String, String), f32>,
) -> f64 {
    let n = chars.len();
    let mut best = f64::INFINITY;
    for mask in 0..1u32 << (n - 1) {
        let mut words = vec![];
        let mut start = 0;
        for i in 1..=n {
            if i == n || mask & (1 << (i - 1)) != 0 {
                words.push(chars[start..i].iter().collect::<String>());
                start = i;
            }
        }
        let mut cost = 0.0;
        let mut prev: Option<&String> = None;
        let mut valid = true;
        for word in &words {
            let Some((_, unigram)) = lexicon.iter().find(|(w, _)| w == word) else {
                valid = false;
                break;
            };
            let c = prev
                .and_then(|p| bigram.get(&(p.clone(), word.clone())))
                .copied()
                .unwrap_or(*unigram);
            cost += f64::from(c);
            prev = Some(word);
        }
        if valid && cost < best {
            best = cost;
        }
    }
    best
}

fn bigram_map(rows: &str) -> hashbrown::HashMap<(String, String), f32> {
    rows.lines()
        .map(|line| {
            let cells: Vec<_> = line.split(',').collect();
            (
                (cells[0].to_string(), cells[1].to_string()),
                cells[2].parse().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_unigram_optimality() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let lexicon = random_lexicon(&mut rng);
        let model =
            Model::new(Lexicon::new(lexicon.iter().cloned(), LexType::System).unwrap()).unwrap();
        let mut segmenter = Segmenter::new(Arc::new(model));
        for _ in 0..10 {
            let text = random_word(&mut rng, 6);
            let terms = segment(&mut segmenter, &text);
            let chars: Vec<_> = text.chars().collect();
            assert_tiling(&terms, chars.len());
            let expected = brute_force(&chars, &lexicon, &Default::default());
            assert!(
                (terms.total_cost() - expected).abs() < 1e-6,
                "{text}: {} != {expected}",
                terms.total_cost()
            );
        }
    }
}

#[test]
fn test_bigram_optimality() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..50 {
        let lexicon = random_lexicon(&mut rng);
        let rows = random_bigram(&mut rng, &lexicon);
        let model = Model::new(Lexicon::new(lexicon.iter().cloned(), LexType::System).unwrap())
            .unwrap()
            .with_bigram_from_reader(rows.as_bytes())
            .unwrap();
        // Wide enough to keep every word ending at a position.
        let mut segmenter = Segmenter::new(Arc::new(model)).beam_width(16).unwrap();
        let bigram = bigram_map(&rows);
        for _ in 0..10 {
            let text = random_word(&mut rng, 6);
            let terms = segment(&mut segmenter, &text);
            let chars: Vec<_> = text.chars().collect();
            assert_tiling(&terms, chars.len());
            let expected = brute_force(&chars, &lexicon, &bigram);
            assert!(
                (terms.total_cost() - expected).abs() < 1e-6,
                "{text}: {} != {expected}",
                terms.total_cost()
            );
        }
    }
}

#[test]
fn test_narrow_beam_covers_input() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let lexicon = random_lexicon(&mut rng);
        let rows = random_bigram(&mut rng, &lexicon);
        let model = Model::new(Lexicon::new(lexicon.iter().cloned(), LexType::System).unwrap())
            .unwrap()
            .with_bigram_from_reader(rows.as_bytes())
            .unwrap();
        let mut segmenter = Segmenter::new(Arc::new(model)).beam_width(1).unwrap();
        let text = random_word(&mut rng, 6) + "X" + &random_word(&mut rng, 6);
        let terms = segment(&mut segmenter, &text);
        let mut sent = Sentence::new();
        sent.set_sentence(&text);
        assert_tiling(&terms, sent.len_token());
    }
}

#[test]
fn test_deterministic_across_threads() {
    let model = Arc::new(
        system_model()
            .with_bigram_from_reader(BIGRAM_CSV.as_bytes())
            .unwrap(),
    );
    let inputs = [MILKCAT, "这个是测试。", "简单的MilkCat", "是是是"];

    let mut segmenter = Segmenter::new(Arc::clone(&model));
    let expected: Vec<Vec<String>> = inputs
        .iter()
        .map(|text| {
            segment(&mut segmenter, text)
                .iter()
                .map(|t| t.text().to_string())
                .collect()
        })
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = Arc::clone(&model);
            std::thread::spawn(move || {
                let mut segmenter = Segmenter::new(model);
                inputs
                    .iter()
                    .map(|text| {
                        segment(&mut segmenter, text)
                            .iter()
                            .map(|t| t.text().to_string())
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
