//! # 命令行参数类型
//!
//! `a:b` 区间、`x,y` 坐标和逗号分隔数值列表的 clap 解析类型。
//!
//! ## 依赖关系
//! - 被 `cli/` 使用

use std::fmt;
use std::str::FromStr;

/// 解析 "a:b" 形式的数值对
pub fn parse_pair(s: &str, sep: char) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 2 {
        return Err(format!("expected two values separated by '{}'", sep));
    }
    let first = parse_number(parts[0])?;
    let second = parse_number(parts[1])?;
    Ok((first, second))
}

fn parse_number(s: &str) -> Result<f64, String> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", s.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not finite", s.trim()));
    }
    Ok(value)
}

/// 区间参数 "start:end"，不要求 start < end（扇区角度可以环绕）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanArg(pub f64, pub f64);

impl FromStr for SpanArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = parse_pair(s, ':')?;
        Ok(SpanArg(a, b))
    }
}

impl fmt::Display for SpanArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl SpanArg {
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.0, self.1)
    }
}

/// 像素坐标 "x,y"
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointArg(pub f64, pub f64);

impl FromStr for PointArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = parse_pair(s, ',')?;
        Ok(PointArg(x, y))
    }
}

impl fmt::Display for PointArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

impl PointArg {
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.0, self.1)
    }
}

/// 逗号分隔的数值列表 "x1,x2,..."
#[derive(Debug, Clone, PartialEq)]
pub struct ListArg(pub Vec<f64>);

impl FromStr for ListArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(parse_number)
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Err("expected at least one value".to_string());
        }
        Ok(ListArg(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_arg() {
        let span: SpanArg = "170:-170".parse().unwrap();
        assert_eq!(span.as_tuple(), (170.0, -170.0));
        assert_eq!(span.to_string(), "170:-170");
        assert!("1:2:3".parse::<SpanArg>().is_err());
        assert!("a:2".parse::<SpanArg>().is_err());
    }

    #[test]
    fn test_point_arg() {
        let p: PointArg = " 512.5, 20 ".parse().unwrap();
        assert_eq!(p.as_tuple(), (512.5, 20.0));
        assert!("512".parse::<PointArg>().is_err());
    }

    #[test]
    fn test_list_arg() {
        let list: ListArg = "0.5,1.2, 3".parse().unwrap();
        assert_eq!(list.0, vec![0.5, 1.2, 3.0]);
        assert!("".parse::<ListArg>().is_err());
        assert!("1,nan".parse::<ListArg>().is_err());
    }
}
