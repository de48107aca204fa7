mod mock;

pub use mock::MockDetectionService;
