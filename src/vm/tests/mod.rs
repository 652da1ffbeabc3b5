// Every test here creates its own MMTk instance over `MockVM`. The mock VM holds the roots
// and the mutators of the running test, so tests that use it run one at a time, see
// `crate::util::test_util::mock_vm::with_mockvm`.

mod mock_tests;
