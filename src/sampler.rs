use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::ItemId;

/// Picks `size` ids uniformly without replacement using a partial Fisher-Yates
/// shuffle. Returns fewer than `size` ids when the listing is shorter.
pub fn sample<R: Rng + ?Sized>(ids: &[ItemId], size: usize, rng: &mut R) -> Vec<ItemId> {
    let mut pool = ids.to_vec();
    let (picked, _) = pool.partial_shuffle(rng, size);
    picked.to_vec()
}
