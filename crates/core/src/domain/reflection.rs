use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A number-prefixed answer code such as `3-good`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerCode(pub String);

impl AnswerCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The leading decimal digit, if any. Only the first character is read, so `10-x` is 1.
    pub fn score(&self) -> Option<u8> {
        self.0.chars().next().and_then(|ch| ch.to_digit(10)).and_then(|d| u8::try_from(d).ok())
    }
}

impl From<&str> for AnswerCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerOption {
    pub text: &'static str,
    pub code: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OptionSet {
    pub placeholder: &'static str,
    /// Action id of the select element rendering this set.
    pub action_id: &'static str,
    pub options: &'static [AnswerOption],
}

impl OptionSet {
    /// Option text for `code`, or an empty string when the code is unknown.
    pub fn text_for(&self, code: &AnswerCode) -> &'static str {
        self.options.iter().find(|option| option.code == code.as_str()).map_or("", |o| o.text)
    }

    pub fn texts(&self) -> Vec<&'static str> {
        self.options.iter().map(|option| option.text).collect()
    }
}

pub const QUALITY_OPTIONS: OptionSet = OptionSet {
    placeholder: "Pick the closest",
    action_id: "quality-select",
    options: &[
        AnswerOption { text: "Terrible", code: "0-terrible" },
        AnswerOption { text: "Bad", code: "1-bad" },
        AnswerOption { text: "OK", code: "2-ok" },
        AnswerOption { text: "Good", code: "3-good" },
        AnswerOption { text: "Awesome", code: "4-awesome" },
    ],
};

pub const AMOUNT_OF_DAY_OPTIONS: OptionSet = OptionSet {
    placeholder: "How much of the day",
    action_id: "amount-select",
    options: &[
        AnswerOption { text: "None of the day", code: "0-none" },
        AnswerOption { text: "A little of the day", code: "1-little" },
        AnswerOption { text: "Some of the day", code: "2-some" },
        AnswerOption { text: "Much of the day", code: "3-much" },
        AnswerOption { text: "Most or all of the day", code: "4-most" },
    ],
};

pub const FEELING_OPTIONS: OptionSet = OptionSet {
    placeholder: "Pick the closest",
    action_id: "feeling-select",
    options: &[
        AnswerOption { text: "Tense or nervous", code: "0-tense" },
        AnswerOption { text: "Stressed or upset", code: "1-stress" },
        AnswerOption { text: "Sad or depressed", code: "2-sad" },
        AnswerOption { text: "Bored", code: "3-bored" },
        AnswerOption { text: "Calm or relaxed", code: "4-calm" },
        AnswerOption { text: "Serene or content", code: "5-serene" },
        AnswerOption { text: "Happy or elated", code: "6-happy" },
        AnswerOption { text: "Excited or alert", code: "7-excited" },
    ],
};

pub const NUMBER_OPTIONS: OptionSet = OptionSet {
    placeholder: "How many",
    action_id: "number-select",
    options: &[
        AnswerOption { text: "0", code: "0-none" },
        AnswerOption { text: "1", code: "1-one" },
        AnswerOption { text: "2", code: "2-two" },
        AnswerOption { text: "3-4", code: "3-few" },
        AnswerOption { text: "5 or more", code: "4-many" },
    ],
};

pub const TIME_OPTIONS: OptionSet = OptionSet {
    placeholder: "Which part of the day",
    action_id: "time-select",
    options: &[
        AnswerOption { text: "In the morning (9:00 – 11:00)", code: "0-morning" },
        AnswerOption { text: "Mid-day (11:00 – 13:00)", code: "1-midday" },
        AnswerOption { text: "In the early afternoon (13:00 – 15:00)", code: "2-earlyAft" },
        AnswerOption { text: "In the late afternoon (15:00 – 17:00)", code: "3-lateAft" },
        AnswerOption { text: "Outside typical work hours", code: "4-nonwork" },
        AnswerOption { text: "Equally throughout the day", code: "5-equally" },
    ],
};

/// Survey fields, in the order questions are asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionField {
    WorkDayQuality,
    WorkOtherPeopleAmount,
    HelpOtherPeopleAmount,
    InterruptedAmount,
    ProgressGoalsAmount,
    QualityWorkAmount,
    LotOfWorkAmount,
    WorkDayFeeling,
    StressfulAmount,
    BreaksAmount,
    MeetingNumber,
    MostProductiveTime,
    LeastProductiveTime,
}

impl ReflectionField {
    pub const ALL: [ReflectionField; 13] = [
        Self::WorkDayQuality,
        Self::WorkOtherPeopleAmount,
        Self::HelpOtherPeopleAmount,
        Self::InterruptedAmount,
        Self::ProgressGoalsAmount,
        Self::QualityWorkAmount,
        Self::LotOfWorkAmount,
        Self::WorkDayFeeling,
        Self::StressfulAmount,
        Self::BreaksAmount,
        Self::MeetingNumber,
        Self::MostProductiveTime,
        Self::LeastProductiveTime,
    ];

    /// Column name, also used as the Slack input block id.
    pub fn key(self) -> &'static str {
        match self {
            Self::WorkDayQuality => "work_day_quality",
            Self::WorkOtherPeopleAmount => "work_other_people_amount",
            Self::HelpOtherPeopleAmount => "help_other_people_amount",
            Self::InterruptedAmount => "interrupted_amount",
            Self::ProgressGoalsAmount => "progress_goals_amount",
            Self::QualityWorkAmount => "quality_work_amount",
            Self::LotOfWorkAmount => "lot_of_work_amount",
            Self::WorkDayFeeling => "work_day_feeling",
            Self::StressfulAmount => "stressful_amount",
            Self::BreaksAmount => "breaks_amount",
            Self::MeetingNumber => "meeting_number",
            Self::MostProductiveTime => "most_productive_time",
            Self::LeastProductiveTime => "least_productive_time",
        }
    }

    pub fn answer(self, answers: &Answers) -> &AnswerCode {
        match self {
            Self::WorkDayQuality => &answers.work_day_quality,
            Self::WorkOtherPeopleAmount => &answers.work_other_people_amount,
            Self::HelpOtherPeopleAmount => &answers.help_other_people_amount,
            Self::InterruptedAmount => &answers.interrupted_amount,
            Self::ProgressGoalsAmount => &answers.progress_goals_amount,
            Self::QualityWorkAmount => &answers.quality_work_amount,
            Self::LotOfWorkAmount => &answers.lot_of_work_amount,
            Self::WorkDayFeeling => &answers.work_day_feeling,
            Self::StressfulAmount => &answers.stressful_amount,
            Self::BreaksAmount => &answers.breaks_amount,
            Self::MeetingNumber => &answers.meeting_number,
            Self::MostProductiveTime => &answers.most_productive_time,
            Self::LeastProductiveTime => &answers.least_productive_time,
        }
    }

    pub fn answer_mut(self, answers: &mut Answers) -> &mut AnswerCode {
        match self {
            Self::WorkDayQuality => &mut answers.work_day_quality,
            Self::WorkOtherPeopleAmount => &mut answers.work_other_people_amount,
            Self::HelpOtherPeopleAmount => &mut answers.help_other_people_amount,
            Self::InterruptedAmount => &mut answers.interrupted_amount,
            Self::ProgressGoalsAmount => &mut answers.progress_goals_amount,
            Self::QualityWorkAmount => &mut answers.quality_work_amount,
            Self::LotOfWorkAmount => &mut answers.lot_of_work_amount,
            Self::WorkDayFeeling => &mut answers.work_day_feeling,
            Self::StressfulAmount => &mut answers.stressful_amount,
            Self::BreaksAmount => &mut answers.breaks_amount,
            Self::MeetingNumber => &mut answers.meeting_number,
            Self::MostProductiveTime => &mut answers.most_productive_time,
            Self::LeastProductiveTime => &mut answers.least_productive_time,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub field: ReflectionField,
    pub options: OptionSet,
}

pub const QUESTIONS: [Question; 13] = [
    Question {
        text: "How was your work day?",
        field: ReflectionField::WorkDayQuality,
        options: QUALITY_OPTIONS,
    },
    Question {
        text: "I worked with other people",
        field: ReflectionField::WorkOtherPeopleAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "I helped other people",
        field: ReflectionField::HelpOtherPeopleAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "My work was interrupted",
        field: ReflectionField::InterruptedAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "I made progress toward my goals",
        field: ReflectionField::ProgressGoalsAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "I did high-quality work",
        field: ReflectionField::QualityWorkAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "I did a lot of work",
        field: ReflectionField::LotOfWorkAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "Which best describes how you feel about your work day?",
        field: ReflectionField::WorkDayFeeling,
        options: FEELING_OPTIONS,
    },
    Question {
        text: "My day was stressful",
        field: ReflectionField::StressfulAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "I took breaks today",
        field: ReflectionField::BreaksAmount,
        options: AMOUNT_OF_DAY_OPTIONS,
    },
    Question {
        text: "How many meetings did you have today?",
        field: ReflectionField::MeetingNumber,
        options: NUMBER_OPTIONS,
    },
    Question {
        text: "Today, I felt most productive",
        field: ReflectionField::MostProductiveTime,
        options: TIME_OPTIONS,
    },
    Question {
        text: "Today, I felt least productive",
        field: ReflectionField::LeastProductiveTime,
        options: TIME_OPTIONS,
    },
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    pub work_day_quality: AnswerCode,
    pub work_other_people_amount: AnswerCode,
    pub help_other_people_amount: AnswerCode,
    pub interrupted_amount: AnswerCode,
    pub progress_goals_amount: AnswerCode,
    pub quality_work_amount: AnswerCode,
    pub lot_of_work_amount: AnswerCode,
    pub work_day_feeling: AnswerCode,
    pub stressful_amount: AnswerCode,
    pub breaks_amount: AnswerCode,
    pub meeting_number: AnswerCode,
    pub most_productive_time: AnswerCode,
    pub least_productive_time: AnswerCode,
}

/// One submitted survey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub team_id: String,
    pub user_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Answers,
}

impl Reflection {
    pub fn answer(&self, field: ReflectionField) -> &AnswerCode {
        field.answer(&self.answers)
    }

    /// Option text for the answer to `field`.
    pub fn answer_text(&self, field: ReflectionField) -> &'static str {
        QUESTIONS
            .iter()
            .find(|question| question.field == field)
            .map_or("", |question| question.options.text_for(self.answer(field)))
    }
}

impl fmt::Display for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date (UTC): {}", self.submitted_at.format("%Y-%m-%d %H:%M:%S"))?;
        for question in QUESTIONS {
            let answer = question.options.text_for(self.answer(question.field));
            writeln!(f, "{}: *{}*", question.text, answer)?;
        }
        Ok(())
    }
}
