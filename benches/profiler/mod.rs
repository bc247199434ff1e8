// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::str::FromStr;
use std::time::Duration;

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse().ok()).unwrap_or(default)
}

/// Criterion config with a flamegraph profiler; tune via `IMPORT_BENCH_*` env vars.
pub fn criterion() -> Criterion {
    let frequency = env_or("IMPORT_BENCH_PROFILE_FREQ", 100_i32).clamp(1, 1000);
    let samples = env_or("IMPORT_BENCH_SAMPLES", 30_usize).clamp(10, 200);
    let measurement = env_or("IMPORT_BENCH_SECS", 5_u64).clamp(1, 120);

    Criterion::default()
        .sample_size(samples)
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(measurement))
        .with_profiler(PProfProfiler::new(frequency, Output::Flamegraph(None)))
}
