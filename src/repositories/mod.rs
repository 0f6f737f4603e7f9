pub(crate) mod access_keys;
pub(crate) mod mock_tests;
pub(crate) mod results;
pub(crate) mod uploads;
pub(crate) mod users;
