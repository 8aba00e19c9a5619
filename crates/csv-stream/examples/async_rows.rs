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

//! Basic async row streaming.
//!
//! Run with: cargo run --example async_rows

use csv_stream::{AsyncRows, ReadOptions};
use std::io::Cursor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = "\
city,country,population
Amsterdam,NL,921402
Utrecht,NL,361924
\"Den Haag\",NL,552995";

    let options = ReadOptions {
        from_line: 1, // skip the header row
        ..Default::default()
    };
    let mut rows = AsyncRows::with_options(Cursor::new(input), options)?;

    while let Some(row) = rows.next_row().await? {
        println!("{} ({}) has {} inhabitants", row[0], row[1], row[2]);
    }

    let stats = rows.stats();
    println!("done after {} reads", stats.reads);
    Ok(())
}
