/*! Integration tests for kvdoc.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - document: typed path operations on a single replica
 * - text: splices and unified diffs
 * - sync: change extraction and merging between replicas
 * - persistence: save/load snapshots
 * - json: export and import
 * - index: shadow index configuration and projection
 * - commands: the command surface end to end
 * - properties: algebraic properties checked with proptest
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kvdoc=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod commands;
mod helpers;
mod persistence;
mod properties;
mod sync;
mod text;
