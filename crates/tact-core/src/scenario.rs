//! Pinned demo message sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, MessageCategory, ParseError, Tone};
use MessageCategory::{Other, Personal, Urgent, Work};
use Tone::{Calm, Empathy};

const BASE_TIMESTAMP: u64 = 1_735_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemoScenario {
    BankFraud,
    MomBirthday,
    OverloadFilter,
}

struct Seed {
    id: u128,
    sender: &'static str,
    body: &'static str,
    offset_secs: u64,
    urgency: f64,
    tone: Tone,
    category: MessageCategory,
}

const fn seed(
    id: u128,
    sender: &'static str,
    body: &'static str,
    offset_secs: u64,
    urgency: f64,
    tone: Tone,
    category: MessageCategory,
) -> Seed {
    Seed {
        id,
        sender,
        body,
        offset_secs,
        urgency,
        tone,
        category,
    }
}

const BANK_FRAUD: &[Seed] = &[
    seed(
        0xD7E5E028_2114_4A0C_9E64_2D3E5B0F0A01,
        "Bank Alert",
        "Fraud alert: card ending 8842 charged $942.13 at 2:14 AM. Call the bank now.",
        0,
        0.99,
        Tone::Urgent,
        Urgent,
    ),
    seed(
        0xD7E5E028_2114_4A0C_9E64_2D3E5B0F0A02,
        "Security Team",
        "A new sign-in was blocked from an unknown device.",
        60,
        0.88,
        Tone::Urgent,
        Urgent,
    ),
    seed(
        0xD7E5E028_2114_4A0C_9E64_2D3E5B0F0A03,
        "Mom",
        "Call me when you are free.",
        120,
        0.30,
        Empathy,
        Personal,
    ),
    seed(
        0xD7E5E028_2114_4A0C_9E64_2D3E5B0F0A04,
        "PM",
        "Standup moved to 10:15.",
        180,
        0.42,
        Calm,
        Work,
    ),
];

const MOM_BIRTHDAY: &[Seed] = &[
    seed(
        0x0D9F8E2A_6F40_4B3D_8E35_4A4D0BCB2201,
        "Mom",
        "Birthday dinner is Sunday at 6 PM. I will bring cake.",
        0,
        0.46,
        Empathy,
        Personal,
    ),
    seed(
        0x0D9F8E2A_6F40_4B3D_8E35_4A4D0BCB2202,
        "Dad",
        "Do not forget candles for Mom's birthday table.",
        60,
        0.34,
        Calm,
        Personal,
    ),
    seed(
        0x0D9F8E2A_6F40_4B3D_8E35_4A4D0BCB2203,
        "Bank Alert",
        "Statement is ready to review.",
        120,
        0.22,
        Calm,
        Other,
    ),
    seed(
        0x0D9F8E2A_6F40_4B3D_8E35_4A4D0BCB2204,
        "PM",
        "Draft agenda for Monday planning attached.",
        180,
        0.35,
        Calm,
        Work,
    ),
];

const OVERLOAD_FILTER: &[Seed] = &[
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA01, "Deals", "Daily discount digest #1", 0, 0.08, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA02, "Deals", "Daily discount digest #2", 15, 0.08, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA03, "Retail Bot", "Flash sale update #3", 30, 0.09, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA04, "News Feed", "Morning brief #4", 45, 0.12, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA05, "Transit", "Service reminder #5", 60, 0.14, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA06, "News Feed", "Midday brief #6", 75, 0.12, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA07, "Calendar Bot", "Reminder summary #7", 90, 0.10, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA08, "Deals", "Daily discount digest #8", 105, 0.08, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA09, "Retail Bot", "Flash sale update #9", 120, 0.09, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0A, "News Feed", "Evening brief #10", 135, 0.12, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0B, "Promo", "Weekly roundup #11", 150, 0.11, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0C, "Promo", "Weekly roundup #12", 165, 0.11, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0D, "Security Team", "Password changed successfully.", 180, 0.28, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0E, "System", "Backup completed overnight.", 195, 0.24, Calm, Other),
    seed(0xAF10D8A6_9605_4F6B_9D93_5EDB0167AA0F, "Boss", "Can we sync tomorrow morning?", 210, 0.40, Calm, Work),
];

impl DemoScenario {
    pub const ALL: [DemoScenario; 3] = [
        DemoScenario::BankFraud,
        DemoScenario::MomBirthday,
        DemoScenario::OverloadFilter,
    ];

    /// Category the session focuses when the scenario is selected.
    pub fn focus_category(self) -> MessageCategory {
        match self {
            DemoScenario::BankFraud => MessageCategory::Urgent,
            DemoScenario::MomBirthday => MessageCategory::Personal,
            DemoScenario::OverloadFilter => MessageCategory::Other,
        }
    }

    /// Whether entering a session with this scenario raises the security alert.
    pub fn triggers_alert(self) -> bool {
        matches!(self, DemoScenario::BankFraud)
    }

    /// The scenario's fixed message set, in arrival order.
    pub fn messages(self) -> Vec<Message> {
        let seeds = match self {
            DemoScenario::BankFraud => BANK_FRAUD,
            DemoScenario::MomBirthday => MOM_BIRTHDAY,
            DemoScenario::OverloadFilter => OVERLOAD_FILTER,
        };
        seeds
            .iter()
            .map(|s| {
                Message::clamped(s.sender, s.body, s.urgency, s.tone, s.category)
                    .with_id(Uuid::from_u128(s.id))
                    .with_timestamp(BASE_TIMESTAMP + s.offset_secs)
            })
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DemoScenario::BankFraud => "bankFraud",
            DemoScenario::MomBirthday => "momBirthday",
            DemoScenario::OverloadFilter => "overloadFilter",
        }
    }
}

impl fmt::Display for DemoScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemoScenario {
    type Err = ParseError;

    /// Accepts the camelCase names plus kebab/snake spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect();
        DemoScenario::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(&folded))
            .ok_or_else(|| ParseError::new("scenario", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_fraud_set() {
        let msgs = DemoScenario::BankFraud.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].sender, "Bank Alert");
        assert_eq!(msgs[0].urgency(), 0.99);
        assert_eq!(msgs[0].timestamp, BASE_TIMESTAMP);
        assert_eq!(
            msgs[0].id.to_string(),
            "d7e5e028-2114-4a0c-9e64-2d3e5b0f0a01"
        );
        assert!(DemoScenario::BankFraud.triggers_alert());
    }

    #[test]
    fn test_messages_are_stable() {
        for s in DemoScenario::ALL {
            assert_eq!(s.messages(), s.messages());
        }
    }

    #[test]
    fn test_focus_category_is_populated() {
        for s in DemoScenario::ALL {
            let focus = s.focus_category();
            assert!(s.messages().iter().any(|m| m.category == focus), "{s}");
        }
    }

    #[test]
    fn test_only_bank_fraud_alerts() {
        assert!(!DemoScenario::MomBirthday.triggers_alert());
        assert!(!DemoScenario::OverloadFilter.triggers_alert());
    }

    #[test]
    fn test_overload_is_mostly_other() {
        let msgs = DemoScenario::OverloadFilter.messages();
        assert_eq!(msgs.len(), 15);
        let other = msgs.iter().filter(|m| m.category == MessageCategory::Other).count();
        assert_eq!(other, 14);
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("bankFraud".parse(), Ok(DemoScenario::BankFraud));
        assert_eq!("mom-birthday".parse(), Ok(DemoScenario::MomBirthday));
        assert_eq!("overload_filter".parse(), Ok(DemoScenario::OverloadFilter));
        assert!("party".parse::<DemoScenario>().is_err());
    }
}
