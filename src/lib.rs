// Library root
// -----------
// Seeds the plaintext passwords file read by Airflow's SimpleAuthManager
// so local development always has a known login. The binary (`main.rs`)
// parses arguments and hands them to `cli::run`.
//
// Module responsibilities:
// - `cli`: argument definitions and the one-shot bootstrap flow.
// - `paths`: picks the target file from explicit inputs.
// - `store`: loads, upserts and atomically rewrites the JSON file.
// - `error`: typed errors shared by the modules above.
pub mod cli;
pub mod error;
pub mod paths;
pub mod store;
