// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod dataset_store_test;
pub mod helpers;
pub mod http_source_test;
pub mod refresh_pipeline_test;
pub mod scheduler_api_test;
