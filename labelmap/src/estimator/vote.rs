/// Most frequent value; ties go to the value seen first.
///
/// Values are compared with `==`, so angles only agree when they came from
/// the same scan step.
pub fn majority_vote<T, I>(values: I) -> Option<T>
where
    T: PartialEq + Copy,
    I: IntoIterator<Item = T>,
{
    // (value, count) in first-seen order. Voter counts are tiny.
    let mut tally: Vec<(T, usize)> = Vec::new();
    for value in values {
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    tally
        .iter()
        .fold(None, |best: Option<(T, usize)>, &(value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}
