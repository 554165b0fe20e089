use rand::Rng;
use rand::seq::SliceRandom;

/// 从 `pool` 中等概率、不放回地抽取 `k` 个元素（部分 Fisher–Yates 洗牌）。
///
/// `k` 大于池大小时返回整个池（顺序随机）。返回顺序不具有业务含义。
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], k: usize, rng: &mut R) -> Vec<T> {
    let k = k.min(pool.len());
    let mut indices: Vec<usize> = (0..pool.len()).collect();
    let (chosen, _) = indices.partial_shuffle(rng, k);
    chosen.iter().map(|&i| pool[i].clone()).collect()
}
