// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 抓取引擎模块
///
/// 抓取来源、浏览器会话管理和多来源降级链
pub mod browser_session;
pub mod browser_source;
pub mod fallback_chain;
pub mod html_document;
pub mod http_source;
pub mod session_state;
pub mod source_profile;
pub mod structured_extractor;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;
