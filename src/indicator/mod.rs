// 스트리밍 기술적 지표 모듈
// 캔들을 하나씩 받아 지표 값을 갱신합니다.

pub mod ichimoku;
pub mod rolling;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::model::Candle;
use std::fmt::Display;

/// 기술적 지표(TA)의 컬렉션을 관리하는 구조체
///
/// 같은 캔들 스트림에서 계산된 여러 매개변수 세트의 결과를 키-값 쌍으로 보관합니다.
#[derive(Debug)]
pub struct TAs<K, T>
where
    K: PartialEq + Eq + Hash + Debug,
{
    /// 이 컬렉션의 이름
    name: String,
    /// 순서가 유지되는 키 목록
    keys: Vec<K>,
    /// 키-값 쌍으로 저장된 기술적 지표
    data: HashMap<K, T>,
}

impl<K, T> Display for TAs<K, T>
where
    K: PartialEq + Eq + Hash + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TAs({})", self.name)
    }
}

impl<K, T> TAs<K, T>
where
    K: PartialEq + Eq + Hash + Debug,
{
    /// 새로운 TAs 인스턴스 생성
    ///
    /// # Arguments
    /// * `name` - 컬렉션 이름
    /// * `keys` - 키 목록
    /// * `data` - 키-값 데이터
    pub fn new(name: String, keys: Vec<K>, data: HashMap<K, T>) -> TAs<K, T> {
        TAs { name, keys, data }
    }

    /// 키 목록 참조 반환
    pub fn get_keys(&self) -> &[K] {
        &self.keys
    }

    /// 지정된 키에 해당하는 값 참조 반환
    ///
    /// # Returns
    /// * `Option<&T>` - 키가 없으면 None
    pub fn get(&self, key: &K) -> Option<&T> {
        self.data.get(key)
    }

    /// 키 순서대로 모든 값의 참조 벡터 반환
    pub fn get_all(&self) -> Vec<&T> {
        self.keys
            .iter()
            .filter_map(|key| self.get(key))
            .collect::<Vec<_>>()
    }

    /// 모든 값이 조건을 만족하는지 확인
    pub fn is_all(&self, is_fn: impl Fn(&T) -> bool) -> bool {
        self.get_all().into_iter().all(is_fn)
    }
}

/// 스트리밍 기술적 지표 인터페이스
///
/// 캔들을 하나씩 받아 내부 상태를 갱신하고 현재 시점의 지표 값을 반환합니다.
pub trait TABuilder<T, C: Candle>: Send + Debug {
    /// 새 데이터로 기술적 지표 업데이트
    ///
    /// # Arguments
    /// * `data` - 새 캔들 데이터
    ///
    /// # Returns
    /// * `T` - 업데이트된 기술적 지표
    fn next(&mut self, data: &C) -> T;
}

/// 여러 기술적 지표 빌더를 관리하는 구조체
///
/// 하나의 캔들을 키별 빌더 모두에 전달합니다. 각 빌더는 서로 독립적입니다.
pub struct TAsBuilder<K, T, C: Candle> {
    /// 이 빌더 컬렉션의 이름
    name: String,
    /// 순서가 유지되는 키 목록
    keys: Vec<K>,
    /// 각 키에 대응하는 개별 빌더
    builders: HashMap<K, Box<dyn TABuilder<T, C>>>,
}

impl<K, T, C> TAsBuilder<K, T, C>
where
    K: PartialEq + Eq + Hash + Clone + Debug,
    C: Candle,
{
    /// 새 TAsBuilder 인스턴스 생성
    ///
    /// # Arguments
    /// * `name` - 빌더 이름
    /// * `keys` - 키 목록 (중복 키는 하나로 합쳐짐)
    /// * `gen_builder` - 각 키에 대한 빌더 생성 함수
    pub fn new(
        name: String,
        keys: &[K],
        gen_builder: impl Fn(&K) -> Box<dyn TABuilder<T, C>>,
    ) -> TAsBuilder<K, T, C> {
        let mut unique_keys: Vec<K> = Vec::with_capacity(keys.len());
        let mut builders: HashMap<K, Box<dyn TABuilder<T, C>>> = HashMap::new();
        for key in keys {
            if builders.contains_key(key) {
                continue;
            }
            builders.insert(key.clone(), gen_builder(key));
            unique_keys.push(key.clone());
        }

        TAsBuilder {
            name,
            keys: unique_keys,
            builders,
        }
    }

    pub fn get_keys(&self) -> &[K] {
        &self.keys
    }

    /// 새 데이터로 기술적 지표 컬렉션 업데이트
    ///
    /// # Arguments
    /// * `data` - 새 캔들 데이터
    ///
    /// # Returns
    /// * `TAs<K, T>` - 업데이트된 기술적 지표 컬렉션
    pub fn next(&mut self, data: &C) -> TAs<K, T> {
        let mut tas: HashMap<K, T> = HashMap::new();
        for (key, builder) in self.builders.iter_mut() {
            let ta = builder.next(data);
            tas.insert(key.clone(), ta);
        }
        TAs::new(self.name.to_owned(), self.keys.clone(), tas)
    }
}

impl<K: Debug, T, C> Debug for TAsBuilder<K, T, C>
where
    C: Candle,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TAsBuilder")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("builders", &format!("<{} builders>", self.builders.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HlcCandle;

    /// 종가 누적 합을 돌려주는 테스트용 빌더
    #[derive(Debug)]
    struct SumBuilder {
        scale: f64,
        sum: f64,
    }

    impl TABuilder<f64, HlcCandle> for SumBuilder {
        fn next(&mut self, data: &HlcCandle) -> f64 {
            self.sum += data.close * self.scale;
            self.sum
        }
    }

    fn sum_builders(keys: &[u32]) -> TAsBuilder<u32, f64, HlcCandle> {
        TAsBuilder::new("sums".to_owned(), keys, |key| {
            Box::new(SumBuilder {
                scale: *key as f64,
                sum: 0.0,
            })
        })
    }

    #[test]
    fn test_tas_get_and_order() {
        let tas = TAs::new(
            "test".to_owned(),
            vec![3, 1, 2],
            HashMap::from([(1, 10.0), (2, 20.0), (3, 30.0)]),
        );

        assert_eq!(tas.get(&2), Some(&20.0));
        assert_eq!(tas.get(&4), None);
        assert_eq!(tas.get_all(), vec![&30.0, &10.0, &20.0]);
        assert!(tas.is_all(|value| *value >= 10.0));
        assert!(!tas.is_all(|value| *value > 10.0));
        assert_eq!(tas.to_string(), "TAs(test)");
    }

    #[test]
    fn test_tas_builder_feeds_every_builder() {
        let mut builder = sum_builders(&[1, 2]);

        builder.next(&HlcCandle::new(1.0, 1.0, 1.0));
        let tas = builder.next(&HlcCandle::new(2.0, 2.0, 2.0));

        assert_eq!(tas.get(&1), Some(&3.0));
        assert_eq!(tas.get(&2), Some(&6.0));
        assert_eq!(tas.get_keys(), &[1, 2]);
    }

    #[test]
    fn test_tas_builder_merges_duplicate_keys() {
        let builder = sum_builders(&[1, 1, 2]);
        assert_eq!(builder.get_keys(), &[1, 2]);
        assert!(format!("{:?}", builder).contains("<2 builders>"));
    }
}
