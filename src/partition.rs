/// Split `items` into `n` contiguous groups of nearly equal size. Each group
/// gets `len / n` items and the first `len % n` groups get one more, so
/// concatenating the groups gives back `items` in order. Empty input gives `n`
/// empty groups, and `n == 0` gives no groups at all.
pub fn divide<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    if n == 0 {
        return Vec::new();
    }
    let target = items.len() / n;
    let remainder = items.len() % n;
    let mut ret = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let end = start + target + usize::from(i < remainder);
        ret.push(items[start..end].to_vec());
        start = end;
    }
    ret
}
