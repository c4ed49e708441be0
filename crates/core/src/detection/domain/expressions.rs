use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    /// Model output order.
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Fearful => "fearful",
            Expression::Disgusted => "disgusted",
            Expression::Surprised => "surprised",
        };
        write!(f, "{name}")
    }
}

/// Probability per expression, in [`Expression::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionScores {
    scores: [f64; 7],
}

impl ExpressionScores {
    pub fn new(scores: [f64; 7]) -> Self {
        Self { scores }
    }

    pub fn from_slice(values: &[f32]) -> Result<Self, String> {
        if values.len() != Expression::ALL.len() {
            return Err(format!(
                "expected {} expression scores, got {}",
                Expression::ALL.len(),
                values.len()
            ));
        }
        let mut scores = [0.0; 7];
        for (dst, src) in scores.iter_mut().zip(values) {
            *dst = *src as f64;
        }
        Ok(Self { scores })
    }

    pub fn get(&self, expression: Expression) -> f64 {
        self.scores[expression.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Expression, f64)> + '_ {
        Expression::ALL.iter().copied().zip(self.scores.iter().copied())
    }

    /// Highest-scoring expression. Ties resolve to the earlier entry.
    pub fn dominant(&self) -> (Expression, f64) {
        self.iter()
            .fold((Expression::Neutral, f64::MIN), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }
}
