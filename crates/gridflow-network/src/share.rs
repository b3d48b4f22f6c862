//! Dividing an amount across parts: by capacity share when a network
//! splits, and by equal shares when a network pushes into acceptors.

/// Apportion `total` across parts with the given capacities.
///
/// Every part first gets `floor(total * cap / sum)`. The remainder goes to
/// the largest part, overflowing to the next-largest while parts are full.
/// Ties go to the earlier part. No part ever exceeds its capacity and the
/// shares always sum to `min(total, sum of capacities)`.
pub fn apportion(total: u64, capacities: &[u64]) -> Vec<u64> {
    let cap_sum: u128 = capacities.iter().map(|&c| u128::from(c)).sum();
    debug_assert!(
        u128::from(total) <= cap_sum,
        "apportioning {total} across capacity {cap_sum}"
    );
    let total = if u128::from(total) > cap_sum {
        log::error!("apportioning {total} across capacity {cap_sum}; excess discarded");
        cap_sum as u64
    } else {
        total
    };
    if cap_sum == 0 {
        return vec![0; capacities.len()];
    }

    let mut shares: Vec<u64> = capacities
        .iter()
        .map(|&c| (u128::from(total) * u128::from(c) / cap_sum) as u64)
        .collect();
    let mut remainder = total - shares.iter().sum::<u64>();

    let mut order: Vec<usize> = (0..capacities.len()).collect();
    order.sort_by(|&a, &b| capacities[b].cmp(&capacities[a]).then(a.cmp(&b)));
    for i in order {
        if remainder == 0 {
            break;
        }
        let give = (capacities[i] - shares[i]).min(remainder);
        shares[i] += give;
        remainder -= give;
    }
    debug_assert_eq!(remainder, 0);
    shares
}

/// Equal-share water-filling of `total` across parts that can each take at
/// most `limits[i]`.
///
/// Open parts repeatedly receive equal shares until they saturate or the
/// amount runs out. What is left after that (fewer units than open parts)
/// is handed out one unit at a time starting at `cursor % limits.len()`.
pub fn water_fill(total: u64, limits: &[u64], cursor: u64) -> Vec<u64> {
    let n = limits.len();
    let mut alloc = vec![0u64; n];
    if n == 0 {
        return alloc;
    }
    let mut remaining = total;
    loop {
        let open: Vec<usize> = (0..n).filter(|&i| alloc[i] < limits[i]).collect();
        if open.is_empty() || remaining == 0 {
            break;
        }
        let share = remaining / open.len() as u64;
        if share == 0 {
            let start = (cursor % n as u64) as usize;
            for k in 0..n {
                if remaining == 0 {
                    break;
                }
                let i = (start + k) % n;
                if alloc[i] < limits[i] {
                    alloc[i] += 1;
                    remaining -= 1;
                }
            }
            break;
        }
        for i in open {
            let give = share.min(limits[i] - alloc[i]);
            alloc[i] += give;
            remaining -= give;
        }
    }
    alloc
}
