//! URL 대상 해석 포트 구현 어댑터.

use anyhow::Result;

use crate::application::ports::TargetResolver;
use crate::domain::target::ReviewTarget;

pub struct UrlTargetResolver;

impl TargetResolver for UrlTargetResolver {
    fn parse(&self, input: &str) -> Result<ReviewTarget> {
        ReviewTarget::parse(input)
    }
}
