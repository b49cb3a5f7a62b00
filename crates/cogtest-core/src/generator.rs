//! Question generators for each test family.
//!
//! Structure is deterministic (subtype rotation, batch sizes); content is
//! drawn from the supplied RNG. Every batch carries a fresh random tag in its
//! question identifiers, so ids never repeat across regenerations even when
//! the content RNG is seeded.

use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::model::{
    Color, Question, QuestionId, QuestionKind, StroopCondition, TestType, WordNumberPair,
};

/// Pool for word-list and paired-associate stimuli.
///
/// Stimuli share one display language with the Stroop words in
/// [`Color::word`]: Turkish, folded to ASCII so any keyboard can type them.
pub const WORD_POOL: [&str; 20] = [
    "elma", "nehir", "masa", "yesil", "muzik", "ev", "dag", "okyanus", "pencere", "golge",
    "hafiza", "kalem", "bahce", "portakal", "gezegen", "gumus", "mum", "orman", "kopru", "bulut",
];

const WORD_LIST_LEN: usize = 8;
const WORD_LIST_ENCODE_SECS: u32 = 8;
const DIGITS_ENCODE_SECS: u32 = 3;
const PATTERN_ENCODE_SECS: u32 = 4;
const PAIRS_LEN: usize = 5;
const PAIRS_ENCODE_SECS: u32 = 7;

/// Letters for the presence search. Targets are drawn from `PRESENT_TARGETS`.
const PRESENT_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPRSTUVWXYZ";
const PRESENT_TARGETS: [char; 2] = ['X', 'Z'];
const PRESENT_LEN: usize = 24;

/// Letters for the counting task; `X` is deliberately over-represented.
const COUNT_ALPHABET: &[u8] = b"ABCDEFXGHIJKLMNOPQRSTUXVWXYZ";
const COUNT_TARGETS: [char; 3] = ['A', 'E', 'X'];
const COUNT_LEN: usize = 36;

/// Generate `count` questions for a test family using the thread-local RNG.
pub fn generate(test_type: TestType, count: usize) -> Vec<Question> {
    generate_with_rng(test_type, count, &mut rand::rng())
}

/// Generate `count` questions for a test family from the given RNG.
pub fn generate_with_rng<R: Rng + ?Sized>(
    test_type: TestType,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    match test_type {
        TestType::Memory => generate_memory_questions(count, rng),
        TestType::Attention => generate_attention_questions(count, rng),
        TestType::Stroop => generate_stroop_trials(count, rng),
    }
}

/// Memory batch: word list, number sequence, 3x3 pattern, paired associate,
/// in round-robin order starting at the word list.
pub fn generate_memory_questions<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Question> {
    let batch = BatchTag::new();
    (0..count)
        .map(|i| match i % 4 {
            0 => Question {
                id: batch.id("mem_words", i),
                kind: QuestionKind::WordListRecall {
                    words: sample_words(rng, WORD_LIST_LEN),
                    encode_seconds: WORD_LIST_ENCODE_SECS,
                },
            },
            1 => {
                let len = rng.random_range(5..=8);
                let digits = (0..len)
                    .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
                    .collect();
                Question {
                    id: batch.id("mem_num", i),
                    kind: QuestionKind::NumberSequence {
                        digits,
                        encode_seconds: DIGITS_ENCODE_SECS,
                    },
                }
            }
            2 => {
                let cells: Vec<u8> = (1..=9).collect();
                let amount = rng.random_range(3..=5);
                let mut positions: Vec<u8> = cells.choose_multiple(rng, amount).copied().collect();
                positions.sort_unstable();
                Question {
                    id: batch.id("mem_pattern", i),
                    kind: QuestionKind::Pattern3x3 {
                        positions,
                        encode_seconds: PATTERN_ENCODE_SECS,
                    },
                }
            }
            _ => {
                let pairs: Vec<WordNumberPair> = sample_words(rng, PAIRS_LEN)
                    .into_iter()
                    .map(|word| WordNumberPair {
                        word,
                        number: rng.random_range(10..=99),
                    })
                    .collect();
                let cue_index = rng.random_range(0..pairs.len());
                let cue = pairs[cue_index].word.clone();
                let answer = pairs[cue_index].number;
                Question {
                    id: batch.id("mem_pairs", i),
                    kind: QuestionKind::PairedAssociate {
                        pairs,
                        cue,
                        answer,
                        encode_seconds: PAIRS_ENCODE_SECS,
                    },
                }
            }
        })
        .collect()
}

/// Attention batch: even indices are presence searches, odd indices are counts.
pub fn generate_attention_questions<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Question> {
    let batch = BatchTag::new();
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                let target = PRESENT_TARGETS[rng.random_range(0..PRESENT_TARGETS.len())];
                // Distractors never include the target, so an "absent" coin
                // flip really is absent.
                let distractors: Vec<u8> = PRESENT_ALPHABET
                    .iter()
                    .copied()
                    .filter(|&b| char::from(b) != target)
                    .collect();
                let mut letters = random_letters(rng, &distractors, PRESENT_LEN);
                let present = rng.random_bool(0.5);
                if present {
                    let slot = rng.random_range(0..letters.len());
                    letters[slot] = target;
                }
                Question {
                    id: batch.id("att_present", i),
                    kind: QuestionKind::TargetPresent {
                        sequence: letters.into_iter().collect(),
                        target,
                        present,
                    },
                }
            } else {
                let letters = random_letters(rng, COUNT_ALPHABET, COUNT_LEN);
                let target = COUNT_TARGETS[rng.random_range(0..COUNT_TARGETS.len())];
                let count = letters.iter().filter(|&&c| c == target).count();
                Question {
                    id: batch.id("att_count", i),
                    kind: QuestionKind::TargetCount {
                        sequence: letters.into_iter().collect(),
                        target,
                        count: u32::try_from(count).unwrap_or(u32::MAX),
                    },
                }
            }
        })
        .collect()
}

/// Stroop batch: each trial is congruent with probability 0.5; otherwise the
/// ink is drawn uniformly from the other colors. The answer is always the ink.
pub fn generate_stroop_trials<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Question> {
    let batch = BatchTag::new();
    (0..count)
        .map(|i| {
            let word = Color::ALL[rng.random_range(0..Color::ALL.len())];
            let (ink, condition) = if rng.random_bool(0.5) {
                (word, StroopCondition::Congruent)
            } else {
                let others: Vec<Color> = Color::ALL.into_iter().filter(|&c| c != word).collect();
                let ink = others[rng.random_range(0..others.len())];
                (ink, StroopCondition::Incongruent)
            };
            Question {
                id: batch.id("stroop", i),
                kind: QuestionKind::Stroop {
                    word,
                    ink,
                    condition,
                },
            }
        })
        .collect()
}

fn sample_words<R: Rng + ?Sized>(rng: &mut R, amount: usize) -> Vec<String> {
    WORD_POOL
        .choose_multiple(rng, amount)
        .map(|w| (*w).to_string())
        .collect()
}

fn random_letters<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> Vec<char> {
    (0..len)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

/// Random per-batch suffix for question ids.
struct BatchTag(String);

impl BatchTag {
    fn new() -> Self {
        let mut tag = Uuid::new_v4().simple().to_string();
        tag.truncate(12);
        Self(tag)
    }

    fn id(&self, prefix: &str, index: usize) -> QuestionId {
        QuestionId::new(format!("{prefix}_{}-{}", index + 1, self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Subtype;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn word_pool_is_distinct_lowercase_ascii() {
        let distinct: HashSet<&str> = WORD_POOL.iter().copied().collect();
        assert_eq!(distinct.len(), WORD_POOL.len());
        for word in WORD_POOL {
            assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{word}");
        }
    }

    #[test]
    fn memory_rotation_is_round_robin() {
        let qs = generate_memory_questions(10, &mut seeded());
        let order: Vec<Subtype> = qs.iter().map(|q| q.kind.subtype()).collect();
        let cycle = [
            Subtype::WordListRecall,
            Subtype::NumberSequence,
            Subtype::Pattern3x3,
            Subtype::PairedAssociate,
        ];
        for (i, subtype) in order.iter().enumerate() {
            assert_eq!(*subtype, cycle[i % 4], "index {i}");
        }
    }

    #[test]
    fn memory_payloads_respect_shape() {
        for q in generate_memory_questions(40, &mut seeded()) {
            match q.kind {
                QuestionKind::WordListRecall { words, .. } => {
                    assert_eq!(words.len(), WORD_LIST_LEN);
                    let unique: HashSet<_> = words.iter().collect();
                    assert_eq!(unique.len(), words.len(), "duplicate word in list");
                }
                QuestionKind::NumberSequence { digits, .. } => {
                    assert!((5..=8).contains(&digits.len()));
                    assert!(digits.chars().all(|c| c.is_ascii_digit()));
                }
                QuestionKind::Pattern3x3 { positions, .. } => {
                    assert!((3..=5).contains(&positions.len()));
                    assert!(positions.windows(2).all(|w| w[0] < w[1]));
                    assert!(positions.iter().all(|p| (1..=9).contains(p)));
                }
                QuestionKind::PairedAssociate {
                    pairs, cue, answer, ..
                } => {
                    assert_eq!(pairs.len(), PAIRS_LEN);
                    let pair = pairs.iter().find(|p| p.word == cue).unwrap();
                    assert_eq!(pair.number, answer);
                    assert!((10..=99).contains(&answer));
                }
                other => panic!("unexpected memory subtype: {other:?}"),
            }
        }
    }

    #[test]
    fn batch_sizes_truncate_rotation() {
        assert!(generate_memory_questions(0, &mut seeded()).is_empty());
        let qs = generate_memory_questions(3, &mut seeded());
        assert_eq!(qs.len(), 3);
        assert_eq!(qs[2].kind.subtype(), Subtype::Pattern3x3);
    }

    #[test]
    fn attention_alternates_by_parity() {
        let qs = generate_attention_questions(9, &mut seeded());
        for (i, q) in qs.iter().enumerate() {
            let expected = if i % 2 == 0 {
                Subtype::TargetPresent
            } else {
                Subtype::TargetCount
            };
            assert_eq!(q.kind.subtype(), expected);
        }
    }

    #[test]
    fn attention_answers_match_sequences() {
        for q in generate_attention_questions(50, &mut seeded()) {
            match q.kind {
                QuestionKind::TargetPresent {
                    sequence,
                    target,
                    present,
                } => {
                    assert_eq!(sequence.len(), PRESENT_LEN);
                    assert_eq!(sequence.contains(target), present);
                }
                QuestionKind::TargetCount {
                    sequence,
                    target,
                    count,
                } => {
                    assert_eq!(sequence.len(), COUNT_LEN);
                    let actual = sequence.chars().filter(|&c| c == target).count();
                    assert_eq!(actual as u32, count);
                }
                other => panic!("unexpected attention subtype: {other:?}"),
            }
        }
    }

    #[test]
    fn stroop_conditions_follow_ink() {
        let trials = generate_stroop_trials(200, &mut seeded());
        let mut seen = HashSet::new();
        for q in &trials {
            let QuestionKind::Stroop {
                word,
                ink,
                condition,
            } = q.kind
            else {
                panic!("expected stroop trial");
            };
            match condition {
                StroopCondition::Congruent => assert_eq!(word, ink),
                StroopCondition::Incongruent => assert_ne!(word, ink),
            }
            assert_eq!(q.kind.expected_answer(), ink.name());
            seen.insert(condition);
        }
        assert_eq!(seen.len(), 2, "200 trials should cover both conditions");
    }

    #[test]
    fn ids_are_unique_within_and_across_batches() {
        let first = generate(TestType::Stroop, 20);
        let second = generate(TestType::Stroop, 20);
        let ids: HashSet<_> = first.iter().chain(&second).map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 40);
        assert!(first[0].id.as_str().starts_with("stroop_1-"));
    }

    #[test]
    fn seeded_generation_is_reproducible_in_content() {
        let a = generate_with_rng(TestType::Memory, 8, &mut seeded());
        let b = generate_with_rng(TestType::Memory, 8, &mut seeded());
        let kinds_a: Vec<_> = a.into_iter().map(|q| q.kind).collect();
        let kinds_b: Vec<_> = b.into_iter().map(|q| q.kind).collect();
        assert_eq!(kinds_a, kinds_b);
    }
}
