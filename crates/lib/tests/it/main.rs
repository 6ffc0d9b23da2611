/*! Integration tests for Mediant.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - codec: Laws of the path↔matrix encoding
 * - record: The record surface, guard discipline and payloads
 * - engine: The mutation protocol end to end
 * - query: Navigation queries over a populated forest
 */

mod codec;
mod helpers;
mod query;
mod record;
