//! 坐标读数: 取偶与单槽延迟调度.

use std::time::{Duration, Instant};

use crate::WorldPoint;

/// 将 `v` 取到最近的偶数.
///
/// 先四舍五入 (`.5` 向上), 若结果为奇数, 则取离 `v` 更近的偶数邻居; 两者等距时取较大者.
/// 非有限值返回 0.
pub fn round_to_nearest_even(v: f64) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    let rounded = (v + 0.5).floor() as i64;
    if rounded.rem_euclid(2) == 0 {
        return rounded;
    }
    let (lower, upper) = (rounded - 1, rounded + 1);
    if (v - lower as f64).abs() < (v - upper as f64).abs() {
        lower
    } else {
        upper
    }
}

/// 取偶后的世界坐标读数.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CoordinateReadout {
    /// x.
    pub x: i64,
    /// y.
    pub y: i64,
    /// z.
    pub z: i64,
}

impl From<WorldPoint> for CoordinateReadout {
    #[inline]
    fn from(p: WorldPoint) -> Self {
        Self {
            x: round_to_nearest_even(p.x),
            y: round_to_nearest_even(p.y),
            z: round_to_nearest_even(p.z),
        }
    }
}

/// 单槽延迟调度器. 新的值总是替换尚未触发的旧值, 并重新计时.
///
/// 时钟由调用者显式传入, 调度器本身不持有定时器.
#[derive(Clone, Debug)]
pub struct DelayedSlot<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> DelayedSlot<T> {
    /// 以 `delay` 为延迟创建.
    #[inline]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// 延迟.
    #[inline]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 在 `now` 调度 `value`. 若替换了尚未触发的值则返回 `true`.
    pub fn schedule(&mut self, value: T, now: Instant) -> bool {
        self.pending.replace((now + self.delay, value)).is_some()
    }

    /// 取消尚未触发的值.
    #[inline]
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    /// 是否有尚未触发的值?
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 触发时刻.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// 若 `now` 已到达触发时刻, 取出值.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((at, _)) if now >= at => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }
}
