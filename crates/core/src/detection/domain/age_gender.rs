use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeGenderPrediction {
    /// Estimated age in years.
    pub age: f64,
    pub gender: Gender,
    /// Probability of `gender`, 0.5..=1.0 for a two-class output.
    pub gender_probability: f64,
}

impl AgeGenderPrediction {
    /// Builds a prediction from `[male, female]` class probabilities.
    pub fn from_probabilities(age: f64, male: f64, female: f64) -> Self {
        let (gender, gender_probability) = if female > male {
            (Gender::Female, female)
        } else {
            (Gender::Male, male)
        };
        Self {
            age: age.max(0.0),
            gender,
            gender_probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.8, 0.2, Gender::Male, 0.8)]
    #[case(0.3, 0.7, Gender::Female, 0.7)]
    #[case(0.5, 0.5, Gender::Male, 0.5)]
    fn test_from_probabilities(
        #[case] male: f64,
        #[case] female: f64,
        #[case] gender: Gender,
        #[case] prob: f64,
    ) {
        let p = AgeGenderPrediction::from_probabilities(30.0, male, female);
        assert_eq!(p.gender, gender);
        assert!((p.gender_probability - prob).abs() < 1e-9);
    }

    #[test]
    fn test_negative_age_clamped() {
        let p = AgeGenderPrediction::from_probabilities(-3.0, 1.0, 0.0);
        assert_eq!(p.age, 0.0);
    }
}
