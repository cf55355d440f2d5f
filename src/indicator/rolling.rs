use std::collections::VecDeque;
use std::fmt::Display;

/// 생성 시 미리 확보하는 최대 값 개수
pub(crate) const MAX_RESERVE: usize = 1024;

/// 최대 크기가 정해진 선입선출 가격 윈도우
///
/// 값은 오래된 것부터 최신 순으로 저장됩니다. 최근 구간의 최고값/최저값과
/// 일정 개수 이전의 값을 조회할 수 있습니다.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

/// NaN을 전파하는 최댓값 (f64::max는 NaN을 무시함)
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// NaN을 전파하는 최솟값
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

impl Display for RollingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RollingWindow({}/{})", self.values.len(), self.capacity)
    }
}

impl RollingWindow {
    /// 새 윈도우 생성
    ///
    /// # Arguments
    /// * `capacity` - 호출이 끝난 뒤 유지할 최대 값 개수
    pub fn new(capacity: usize) -> Self {
        RollingWindow {
            capacity,
            // 축출 직전에는 capacity + 1 개까지 담긴다
            values: VecDeque::with_capacity(capacity.saturating_add(1).min(MAX_RESERVE)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 최신 값 추가 (축출은 하지 않음)
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
    }

    /// 최대 크기를 넘었다면 가장 오래된 값 하나를 제거합니다.
    ///
    /// # Returns
    /// * `Option<f64>` - 제거된 값
    pub fn evict_overflow(&mut self) -> Option<f64> {
        if self.values.len() > self.capacity {
            self.values.pop_front()
        } else {
            None
        }
    }

    /// 최근 `period`개 값의 최고값
    ///
    /// # Arguments
    /// * `period` - 조회 구간 길이
    ///
    /// # Returns
    /// * `Option<f64>` - 값이 `period`개 미만이거나 `period`가 0이면 None
    pub fn max_of_last(&self, period: usize) -> Option<f64> {
        self.fold_last(period, nan_max)
    }

    /// 최근 `period`개 값의 최저값
    ///
    /// # Arguments
    /// * `period` - 조회 구간 길이
    ///
    /// # Returns
    /// * `Option<f64>` - 값이 `period`개 미만이거나 `period`가 0이면 None
    pub fn min_of_last(&self, period: usize) -> Option<f64> {
        self.fold_last(period, nan_min)
    }

    /// 최신 값으로부터 `offset`만큼 이전의 값 (`offset`이 0이면 최신 값)
    pub fn back(&self, offset: usize) -> Option<f64> {
        let len = self.values.len();
        if len > offset {
            self.values.get(len - 1 - offset).copied()
        } else {
            None
        }
    }

    fn fold_last(&self, period: usize, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
        if self.values.len() < period {
            return None;
        }

        self.values.iter().rev().take(period).copied().reduce(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_of(capacity: usize, values: &[f64]) -> RollingWindow {
        let mut window = RollingWindow::new(capacity);
        for value in values {
            window.push(*value);
            window.evict_overflow();
        }
        window
    }

    #[test]
    fn test_max_min_of_last() {
        let window = window_of(10, &[3.0, 7.0, 1.0, 5.0, 4.0]);

        assert_eq!(window.max_of_last(5), Some(7.0));
        assert_eq!(window.min_of_last(5), Some(1.0));
        // 최근 2개: 5.0, 4.0
        assert_eq!(window.max_of_last(2), Some(5.0));
        assert_eq!(window.min_of_last(2), Some(4.0));
        assert_eq!(window.max_of_last(1), Some(4.0));
    }

    #[test]
    fn test_insufficient_values() {
        let window = window_of(10, &[3.0, 7.0]);
        assert_eq!(window.max_of_last(3), None);
        assert_eq!(window.min_of_last(3), None);
    }

    #[test]
    fn test_zero_period_has_no_extremum() {
        let window = window_of(10, &[3.0, 7.0]);
        assert_eq!(window.max_of_last(0), None);
        assert_eq!(window.min_of_last(0), None);
    }

    #[test]
    fn test_evict_overflow_one_per_call() {
        let mut window = RollingWindow::new(3);
        for value in [1.0, 2.0, 3.0] {
            window.push(value);
            assert_eq!(window.evict_overflow(), None);
        }

        window.push(4.0);
        assert_eq!(window.len(), 4);
        assert_eq!(window.evict_overflow(), Some(1.0));
        assert_eq!(window.len(), 3);
        assert_eq!(window.evict_overflow(), None);
        assert_eq!(window.min_of_last(3), Some(2.0));
    }

    #[test]
    fn test_back_offset() {
        let window = window_of(10, &[1.0, 2.0, 3.0]);
        assert_eq!(window.back(0), Some(3.0));
        assert_eq!(window.back(2), Some(1.0));
        assert_eq!(window.back(3), None);
    }

    #[test]
    fn test_nan_propagates() {
        let window = window_of(10, &[1.0, f64::NAN, 3.0]);
        assert!(window.max_of_last(3).unwrap().is_nan());
        assert!(window.min_of_last(2).unwrap().is_nan());
        // NaN이 구간 밖이면 영향 없음
        assert_eq!(window.max_of_last(1), Some(3.0));
    }

    #[test]
    fn test_infinity_is_regular_value() {
        let window = window_of(10, &[1.0, f64::INFINITY, 3.0]);
        assert_eq!(window.max_of_last(3), Some(f64::INFINITY));
        assert_eq!(window.min_of_last(3), Some(1.0));
    }

    #[test]
    fn test_huge_capacity_does_not_reserve() {
        let mut window = RollingWindow::new(usize::MAX);
        window.push(1.0);
        assert_eq!(window.evict_overflow(), None);
        assert_eq!(window.max_of_last(usize::MAX), None);
        assert_eq!(window.back(usize::MAX), None);
        assert_eq!(window.to_string(), format!("RollingWindow(1/{})", usize::MAX));
    }

    #[test]
    fn test_display() {
        let window = window_of(5, &[1.0, 2.0]);
        assert_eq!(window.capacity(), 5);
        assert_eq!(window.to_string(), "RollingWindow(2/5)");
    }

    #[test]
    fn test_zero_capacity_never_retains() {
        let window = window_of(0, &[1.0, 2.0]);
        assert!(window.is_empty());
    }
}
