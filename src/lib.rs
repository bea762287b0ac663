pub mod adapter;
pub mod domain;
pub mod infrastructure;
pub mod usecase;

/// テスト用インメモリ実装とヘルパー（統合テストから利用）
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
