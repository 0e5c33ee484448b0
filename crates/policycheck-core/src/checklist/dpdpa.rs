//! Built-in DPDPA checklist.
//!
//! Requirements derived from the Digital Personal Data Protection Act, 2023,
//! sections 4 through 8. Each tuple is `(section_id, title, items)` and each
//! item is `(id, requirement_text)`.

use super::registry::{ChecklistItem, ChecklistRegistry, ChecklistSection};

type SectionSeed = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const DPDPA_SECTIONS: &[SectionSeed] = &[
    (
        "4",
        "Grounds for Processing Personal Data",
        &[
            ("4.1", "The policy must state that personal data is processed only as per the provisions of the Digital Personal Data Protection Act, 2023."),
            ("4.2", "The policy must confirm that personal data is processed only for a lawful purpose."),
            ("4.3", "The policy must define lawful purpose as any purpose not expressly forbidden by law."),
            ("4.4", "The policy must include a statement that personal data is processed only with the consent of the Data Principal."),
            ("4.5", "Alternatively, the policy must specify that personal data is processed for certain legitimate uses, as defined under the Act."),
        ],
    ),
    (
        "5",
        "Notice",
        &[
            ("5.1", "The policy must state that every request for consent is accompanied or preceded by a notice from the Data Fiduciary to the Data Principal."),
            ("5.2", "The notice must clearly specify the personal data proposed to be processed."),
            ("5.3", "The notice must clearly specify the purpose for which the personal data is proposed to be processed."),
            ("5.4", "The notice must explain the manner in which the Data Principal can exercise her rights under Section 6(4) (withdrawal of consent)."),
            ("5.5", "The notice must explain the manner in which the Data Principal can exercise her rights under Section 13 (grievance redressal)."),
            ("5.6", "The notice must specify the manner in which a complaint can be made to the Data Protection Board."),
            ("5.7", "If consent was obtained before the commencement of the Act, the policy must state that a notice will be sent as soon as reasonably practicable."),
            ("5.8", "The post-commencement notice must mention the personal data that has been processed."),
            ("5.9", "The post-commencement notice must mention the purpose for which the personal data has been processed."),
            ("5.10", "The post-commencement notice must mention the manner in which the Data Principal can exercise her rights under Section 6(4)."),
            ("5.11", "The post-commencement notice must mention the manner in which the Data Principal can exercise her rights under Section 13."),
            ("5.12", "The post-commencement notice must mention the manner in which a complaint can be made to the Board."),
            ("5.13", "The policy must mention that the Data Fiduciary may continue to process personal data until the Data Principal withdraws her consent."),
            ("5.14", "The policy must provide the Data Principal an option to access the contents of the notice in English or any language listed in the Eighth Schedule of the Constitution."),
        ],
    ),
    (
        "6",
        "Consent",
        &[
            ("6.1", "The policy must state that consent is free, specific, informed, unconditional, and unambiguous, given through a clear affirmative action."),
            ("6.2", "The policy must specify that consent signifies agreement to process personal data only for the specified purpose."),
            ("6.3", "The policy must state that consent is limited to such personal data as is necessary for the specified purpose."),
            ("6.4", "The policy must mention that any part of the consent that violates this Act, rules under it, or any other law in force is invalid to that extent."),
            ("6.5", "The request for consent must be presented in clear and plain language."),
            ("6.6", "The request for consent must allow the Data Principal to access it in English or any language listed in the Eighth Schedule of the Constitution."),
            ("6.7", "The request for consent must provide contact details of a Data Protection Officer or another authorised person responsible for handling Data Principal queries."),
            ("6.8", "The policy must clearly state that the Data Principal has the right to withdraw consent at any time."),
            ("6.9", "The ease of withdrawing consent must be comparable to the ease with which consent was given."),
            ("6.10", "The policy must mention that consequences of withdrawal shall be borne by the Data Principal."),
            ("6.11", "The policy must state that withdrawal does not affect the legality of data processing done before withdrawal."),
            ("6.12", "The policy must mention that upon withdrawal of consent, the Data Fiduciary and its Data Processors must cease processing the personal data within a reasonable time, unless permitted by law."),
            ("6.13", "The policy must state that consent can be managed, reviewed, or withdrawn through a Consent Manager."),
            ("6.14", "The policy must specify that the Consent Manager is accountable to the Data Principal and acts on her behalf."),
            ("6.15", "The policy must specify that every Consent Manager is registered with the Board under prescribed conditions."),
            ("6.16", "The policy must mention that, in case of dispute, the Data Fiduciary must prove that proper notice was given and valid consent was obtained as per the Act and its rules."),
        ],
    ),
    (
        "7",
        "Certain Legitimate Uses",
        &[
            ("7.1", "The policy must allow personal data to be processed for the specified purpose for which the Data Principal voluntarily provided the data, if she has not indicated non-consent to such use."),
            ("7.2", "The policy must permit personal data to be processed by the State or its instrumentalities for providing or issuing subsidy, benefit, service, certificate, licence, or permit, as prescribed, where the Data Principal has previously consented to such processing."),
            ("7.3", "The policy must allow personal data to be processed by the State or its instrumentalities if the data is already available in digital or digitised form in notified government databases, subject to prescribed standards and government policies."),
            ("7.4", "The policy must allow personal data to be processed by the State or its instrumentalities for performing any legal function under existing Indian laws or in the interest of sovereignty and integrity of India or State security."),
            ("7.5", "The policy must allow personal data to be processed to fulfil a legal obligation requiring any person to disclose information to the State or its instrumentalities, as per applicable laws."),
            ("7.6", "The policy must permit personal data to be processed for compliance with any judgment, decree, or order issued under Indian law, or for contractual or civil claims under foreign laws."),
            ("7.7", "The policy must allow personal data to be processed to respond to a medical emergency involving a threat to life or immediate health risk of the Data Principal or any individual."),
            ("7.8", "The policy must allow personal data to be processed to provide medical treatment or health services during an epidemic, outbreak, or other threat to public health."),
            ("7.9", "The policy must permit processing of personal data to ensure safety of or provide assistance/services to individuals during any disaster or breakdown of public order."),
            ("7.10", "The policy must define 'disaster' in accordance with the Disaster Management Act, 2005 (Section 2(d))."),
            ("7.11", "The policy must allow personal data to be processed for purposes related to employment, or to safeguard the employer from loss or liability, including prevention of corporate espionage, confidentiality of trade secrets or IP, and enabling services/benefits to employee Data Principals."),
        ],
    ),
    (
        "8",
        "General Obligations of Data Fiduciary",
        &[
            ("8.1", "The policy must state that the Data Fiduciary is responsible for complying with the Act and its rules, even if the Data Principal fails to perform her duties."),
            ("8.2", "The policy must state that the Data Fiduciary may engage or involve a Data Processor only under a valid contract to process personal data for offering goods or services."),
            ("8.3", "The policy must ensure that if personal data is used to make a decision affecting the Data Principal, the data must be complete, accurate, and consistent."),
            ("8.4", "The policy must ensure that if personal data is disclosed to another Data Fiduciary, the data must be complete, accurate, and consistent."),
            ("8.5", "The policy must require the Data Fiduciary to implement appropriate technical and organisational measures to ensure compliance with the Act and its rules."),
            ("8.6", "The policy must mandate reasonable security safeguards to protect personal data from breaches, including breaches by its Data Processors."),
            ("8.7", "The policy must state that in the event of a personal data breach, the Data Fiduciary shall inform both the Board and each affected Data Principal in the prescribed manner."),
            ("8.8", "The policy must mandate that personal data be erased upon withdrawal of consent or as soon as it is reasonable to assume that the specified purpose is no longer being served, whichever is earlier."),
            ("8.9", "The policy must mandate that the Data Fiduciary must cause its Data Processors to erase the data when retention is no longer justified."),
            ("8.10", "The policy must define that the specified purpose is deemed no longer served if the Data Principal has neither approached the Data Fiduciary for the purpose nor exercised her rights within the prescribed time period."),
            ("8.11", "The policy must require publishing the business contact details of the Data Protection Officer (if applicable) or of an authorised person able to respond to questions about personal data processing."),
            ("8.12", "The policy must provide an effective grievance redressal mechanism for Data Principals."),
            ("8.13", "The policy must clarify that a Data Principal is considered as not having approached the Data Fiduciary if she has not initiated contact in person, or through physical or electronic communication, for the purpose within a prescribed period."),
        ],
    ),
];

impl ChecklistRegistry {
    /// The built-in DPDPA checklist (sections 4 to 8).
    pub fn dpdpa() -> Self {
        let sections = DPDPA_SECTIONS
            .iter()
            .map(|(section_id, title, items)| ChecklistSection {
                section_id: (*section_id).to_string(),
                title: (*title).to_string(),
                items: items
                    .iter()
                    .map(|(id, text)| ChecklistItem::new(*id, *text))
                    .collect(),
            })
            .collect();

        Self::from_sections_unchecked("DPDPA 2023", sections)
    }
}
