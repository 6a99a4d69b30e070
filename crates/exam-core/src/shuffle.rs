//! Unbiased shuffling of questions and answer options.

use crate::models::Question;
use rand::seq::SliceRandom;
use rand::{rng, Rng};

/// Return a uniformly shuffled copy of `items`. The input is left untouched.
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rng())
}

/// Like [`shuffle`] with an explicit random source.
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy
}

/// Return a copy of `question` with its options permuted.
///
/// The correct answer is followed by position: the original correct slot is
/// tracked through the permutation, so duplicate option texts cannot move
/// `correct_index` onto the wrong duplicate.
pub fn shuffle_options(question: &Question) -> Question {
    shuffle_options_with(question, &mut rng())
}

/// Like [`shuffle_options`] with an explicit random source.
pub fn shuffle_options_with<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Question {
    let mut order: Vec<usize> = (0..question.options.len()).collect();
    order.shuffle(rng);

    let options = order.iter().map(|&i| question.options[i].clone()).collect();
    let correct_index = order
        .iter()
        .position(|&i| i == question.correct_index)
        .unwrap_or(question.correct_index);

    Question {
        options,
        correct_index,
        ..question.clone()
    }
}
