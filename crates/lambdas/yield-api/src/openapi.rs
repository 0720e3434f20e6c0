// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::models::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staking Yield API",
        version = "1.0.0",
        description = "APR and APY of staking rewards, derived from the most recent epoch boundaries on chain.",
        contact(name = "Staking Yield Development Team")
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "APR", description = "Staking reward yield endpoints")
    ),
    paths(
        crate::handler::health_check,
        crate::routes::apr::get_apr_calculation,
    ),
    components(schemas(
        HealthResponse,
        AprCalculationResponse,
        AprCalculationData,
        TotalStaked,
        AprAverages,
        AprYields,
        NoEpochBlocksResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;
