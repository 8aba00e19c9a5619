// Dweve CSV Stream - Streaming CSV Reader
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Header-keyed record streaming.
//!
//! Run with: cargo run --example records

use csv_stream::AsyncRecords;
use std::io::Cursor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = "\
name,role
alice,maintainer
bob,\"release manager\"";

    let mut records = AsyncRecords::new(Cursor::new(input))?;

    while let Some(record) = records.next_record().await? {
        let name = record.get("name").map(String::as_str).unwrap_or("?");
        let role = record.get("role").map(String::as_str).unwrap_or("?");
        println!("{name}: {role}");
    }

    Ok(())
}
